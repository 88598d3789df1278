use serde::{Deserialize, Serialize};

/// Code of the language analyses are produced in. Selecting it means no
/// translation is needed.
pub const SOURCE_LANGUAGE_CODE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub code: String,
    pub display_name: String,
}

const CATALOG: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("ar", "Arabic"),
    ("fr", "French"),
    ("de", "German"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ru", "Russian"),
    ("pt", "Portuguese"),
    ("it", "Italian"),
];

impl Language {
    pub fn new(code: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
        }
    }

    pub fn source() -> Self {
        Self::new(SOURCE_LANGUAGE_CODE, "English")
    }

    pub fn catalog() -> Vec<Language> {
        CATALOG
            .iter()
            .map(|(code, name)| Language::new(*code, *name))
            .collect()
    }

    /// Exact, case-sensitive lookup in the catalog.
    pub fn find(code: &str) -> Option<Language> {
        CATALOG
            .iter()
            .find(|(candidate, _)| *candidate == code)
            .map(|(code, name)| Language::new(*code, *name))
    }

    pub fn is_source(&self) -> bool {
        is_source_code(&self.code)
    }
}

pub fn is_source_code(code: &str) -> bool {
    code == SOURCE_LANGUAGE_CODE
}
