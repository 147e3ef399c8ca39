//! Structure free-text consultation answers into recommendation entries.

use serde_json::{json, Value};

/// Split an agent's free-text answer into `{title, description}` entries.
/// Entries begin at numbered (`1.`, `2.`, ...) or bulleted lines; preamble
/// before the first entry is ignored.
pub fn parse_recommendations(text: &str) -> Vec<Value> {
    let mut recommendations = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in text.lines() {
        let line = line.trim();
        if is_entry_start(line) {
            if let Some((title, description)) = current.take() {
                recommendations.push(entry(title, &description));
            }
            current = Some((line.to_string(), String::new()));
        } else if let Some((_, description)) = current.as_mut() {
            if !line.is_empty() {
                description.push_str(line);
                description.push(' ');
            }
        }
    }

    if let Some((title, description)) = current {
        recommendations.push(entry(title, &description));
    }
    recommendations
}

fn is_entry_start(line: &str) -> bool {
    if line.starts_with('•') || line.starts_with("- ") {
        return true;
    }
    let mut chars = line.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(digit), Some('.')) if digit.is_ascii_digit()
    )
}

fn entry(title: String, description: &str) -> Value {
    json!({
        "title": title,
        "description": description.trim_end(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_entries_with_continuations() {
        let text = "Here is what I suggest for your apartment:\n\n\
                    1. Smart thermostat program\n\
                    Cuts heating and cooling costs.\n\
                    Eligible for a $50 rebate.\n\
                    2. LED retrofit\n\
                    Replace remaining halogen bulbs.";
        let recommendations = parse_recommendations(text);

        assert_eq!(recommendations.len(), 2);
        assert_eq!(recommendations[0]["title"], json!("1. Smart thermostat program"));
        assert_eq!(
            recommendations[0]["description"],
            json!("Cuts heating and cooling costs. Eligible for a $50 rebate.")
        );
        assert_eq!(recommendations[1]["title"], json!("2. LED retrofit"));
    }

    #[test]
    fn bulleted_entries_parse() {
        let text = "• Insulation upgrade\nSeals the attic.\n• Time-of-use plan";
        let recommendations = parse_recommendations(text);
        assert_eq!(recommendations.len(), 2);
        assert_eq!(recommendations[1]["title"], json!("• Time-of-use plan"));
        assert_eq!(recommendations[1]["description"], json!(""));
    }

    #[test]
    fn text_without_entries_yields_nothing() {
        assert!(parse_recommendations("No structured advice here.").is_empty());
        assert!(parse_recommendations("").is_empty());
    }
}
