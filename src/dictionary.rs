//! Tag Dictionary - CSV First-Column Extraction
//!
//! Parses the autocomplete dictionary file: one tag per row, first CSV
//! column only, quoted fields honored.

/// Extract unique tags from dictionary CSV text, first-seen order kept.
/// Header rows named `tag` or `name` are skipped.
pub fn parse_dictionary(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut tags = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let tag = first_column(line).trim();
        if tag.is_empty() || tag.eq_ignore_ascii_case("tag") || tag.eq_ignore_ascii_case("name") {
            continue;
        }
        if seen.insert(tag.to_string()) {
            tags.push(tag.to_string());
        }
    }

    tags
}

fn first_column(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix('"') {
        if let Some(end) = rest.find('"') {
            return &rest[..end];
        }
    }
    line.split(',').next().unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_first_column_and_dedupes() {
        let tags = parse_dictionary("tag,count\nred hair,120\nblue eyes,98\nred hair,3\n");
        assert_eq!(tags, vec!["red hair", "blue eyes"]);
    }

    #[test]
    fn quoted_first_field_keeps_embedded_commas() {
        let tags = parse_dictionary("\"looking back, smiling\",44\nplain,1");
        assert_eq!(tags, vec!["looking back, smiling", "plain"]);
    }

    #[test]
    fn blank_lines_and_headers_skipped() {
        let tags = parse_dictionary("Name,Count\n\n  \nvalid,1\n");
        assert_eq!(tags, vec!["valid"]);
    }

    #[test]
    fn unterminated_quote_falls_back_to_comma_split() {
        let tags = parse_dictionary("\"broken,2\n");
        assert_eq!(tags, vec!["\"broken"]);
    }
}
