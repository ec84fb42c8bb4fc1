// Output formatting: terminal tables and the Markdown report.

pub mod markdown;
pub mod terminal;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Respects UTF-8 character boundaries, so accented occupation titles never
/// cause a panic.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_chars("Cuochi", 10), "Cuochi");
    }

    #[test]
    fn test_truncate_respects_multibyte() {
        assert_eq!(truncate_chars("àèìòù", 3), "àèì...");
    }
}
