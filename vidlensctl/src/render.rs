use vidlens_core::{AnalysisRecord, Language};

pub(crate) trait DisplayFallback {
    fn display(&self) -> String;
}

fn push_section(lines: &mut Vec<String>, title: &str, body: &Option<String>) {
    if let Some(body) = body {
        lines.push(format!("## {title}"));
        lines.push(body.clone());
        lines.push(String::new());
    }
}

fn push_list(lines: &mut Vec<String>, title: &str, items: &Option<Vec<String>>) {
    if let Some(items) = items {
        lines.push(format!("## {title}"));
        lines.extend(items.iter().map(|item| format!("• {item}")));
        lines.push(String::new());
    }
}

impl DisplayFallback for AnalysisRecord {
    fn display(&self) -> String {
        let mut lines = Vec::new();
        if let Some(error) = &self.error {
            lines.push(format!("Error: {error}"));
            if let Some(raw) = &self.raw_text {
                lines.push(String::new());
                lines.push(raw.clone());
            }
            return lines.join("\n");
        }

        push_section(&mut lines, "Summary", &self.summary);
        push_section(&mut lines, "Setting", &self.setting);
        push_section(&mut lines, "Mood", &self.mood);
        push_list(&mut lines, "Emotions", &self.emotions);
        push_section(&mut lines, "People", &self.people);
        push_section(&mut lines, "Topic", &self.topic);
        push_list(&mut lines, "Viral suggestions", &self.viral_suggestions);
        push_list(&mut lines, "Title suggestions", &self.title_suggestions);
        if let Some(moments) = &self.key_moments {
            lines.push("## Key moments".to_string());
            lines.extend(
                moments
                    .iter()
                    .map(|moment| format!("[{}] {}", moment.timestamp, moment.description)),
            );
        }

        if lines.is_empty() {
            return "No analysis available".to_string();
        }
        lines.join("\n").trim_end().to_string()
    }
}

impl DisplayFallback for Vec<Language> {
    fn display(&self) -> String {
        self.iter()
            .map(|language| format!("{:<4}{}", language.code, language.display_name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
