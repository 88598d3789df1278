use thiserror::Error;
use tracing::warn;

use crate::record::AnalysisRecord;

pub const NO_STRUCTURED_DATA: &str = "could not parse structured data";
pub const PARSE_FAILED: &str = "failed to parse response";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJsonObject,
    #[error("invalid analysis JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Turns raw model output into a record. Never fails: malformed output becomes
/// a diagnostic record carrying the raw text.
pub fn parse_analysis(raw: &str) -> AnalysisRecord {
    match try_parse_analysis(raw) {
        Ok(record) => record,
        Err(ParseError::NoJsonObject) => {
            warn!(target: "parse", chars = raw.len(), "model output has no JSON object");
            AnalysisRecord::diagnostic(NO_STRUCTURED_DATA, raw)
        }
        Err(ParseError::Decode(err)) => {
            warn!(target: "parse", error = %err, "model output JSON did not decode");
            AnalysisRecord::diagnostic(PARSE_FAILED, format!("{err}\n\n{raw}"))
        }
    }
}

pub fn try_parse_analysis(raw: &str) -> Result<AnalysisRecord, ParseError> {
    let span = json_object_span(raw).ok_or(ParseError::NoJsonObject)?;
    Ok(serde_json::from_str(span)?)
}

/// First `{` through the last `}`, so fences and surrounding prose are skipped.
fn json_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KeyMoment;

    #[test]
    fn extracts_object_wrapped_in_fences_and_prose() {
        let raw = "Here is the analysis:\n```json\n{\"summary\": \"A dog plays.\", \"mood\": \"happy\", \"keyMoments\": [{\"timestamp\": \"0:05\", \"description\": \"dog runs\"}], \"confidence\": 0.9}\n```\nHope this helps!";
        let record = parse_analysis(raw);
        assert_eq!(
            record,
            AnalysisRecord {
                summary: Some("A dog plays.".into()),
                mood: Some("happy".into()),
                key_moments: Some(vec![KeyMoment::new("0:05", "dog runs")]),
                ..AnalysisRecord::default()
            }
        );
    }

    #[test]
    fn text_without_object_keeps_raw_text() {
        let raw = "I could not watch this video.";
        let record = parse_analysis(raw);
        assert_eq!(record.error.as_deref(), Some(NO_STRUCTURED_DATA));
        assert_eq!(record.raw_text.as_deref(), Some(raw));
        assert_eq!(record.summary, None);
    }

    #[test]
    fn reversed_braces_are_not_a_span() {
        let record = parse_analysis("} nothing here {");
        assert_eq!(record.error.as_deref(), Some(NO_STRUCTURED_DATA));
    }

    #[test]
    fn invalid_json_yields_diagnostic_detail() {
        let raw = "{\"summary\": \"unterminated}";
        let record = parse_analysis(raw);
        assert_eq!(record.error.as_deref(), Some(PARSE_FAILED));
        let detail = record.raw_text.unwrap();
        assert!(detail.contains(raw));
        assert!(detail.len() > raw.len());
    }

    #[test]
    fn wrong_field_types_are_rejected() {
        let record = parse_analysis("{\"summary\": 42}");
        assert_eq!(record.error.as_deref(), Some(PARSE_FAILED));
        assert!(matches!(
            try_parse_analysis("{\"keyMoments\": [{\"timestamp\": \"0:01\"}]}"),
            Err(ParseError::Decode(_))
        ));
    }

    #[test]
    fn parsed_records_round_trip_through_json() {
        for raw in [
            "{\"summary\": \"s\", \"emotions\": \"joy\\nfear\"}",
            "no json",
            "{broken",
        ] {
            let record = parse_analysis(raw);
            let decoded: AnalysisRecord =
                serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
            assert_eq!(decoded, record);
        }
    }
}
