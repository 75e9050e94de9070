use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // A list marker is an integer followed by `.` or `)` at the start of a
    // line, with optional leading whitespace.
    static ref LIST_MARKER: Regex = Regex::new(r"(?m)^[ \t]*\d+[.)][ \t]*").unwrap();
}

/// Extract the ordered items of a numbered list from a raw model response.
///
/// Each item's text runs from just after its marker to the next marker, a
/// blank line, or the end of input, trimmed. No deduplication or plausibility
/// checking happens here; downstream stages own robustness. Pure and
/// idempotent.
pub fn parse_numbered_list(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let markers: Vec<_> = LIST_MARKER.find_iter(text).collect();
    let mut items = Vec::with_capacity(markers.len());

    for (index, marker) in markers.iter().enumerate() {
        let start = marker.end();
        let end = markers
            .get(index + 1)
            .map(|next| next.start())
            .unwrap_or(text.len());

        // A blank line terminates the list item early.
        let segment = &text[start..end];
        let item = segment.split("\n\n").next().unwrap_or("").trim();

        if !item.is_empty() {
            items.push(item.to_string());
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_numbered_list() {
        assert_eq!(parse_numbered_list("1. Uber\n2. Lyft\n\n"), vec!["Uber", "Lyft"]);
    }

    #[test]
    fn test_parenthesis_markers_and_whitespace() {
        let text = "  1) Grab \n\t2)   Gojek\n3. Bolt";
        assert_eq!(parse_numbered_list(text), vec!["Grab", "Gojek", "Bolt"]);
    }

    #[test]
    fn test_preamble_and_trailing_prose() {
        let text = "Here are the competitors:\n1. Didi\n2. Ola\n\nLet me know if you need more.";
        assert_eq!(parse_numbered_list(text), vec!["Didi", "Ola"]);
    }

    #[test]
    fn test_empty_and_markerless_input() {
        assert!(parse_numbered_list("").is_empty());
        assert!(parse_numbered_list("   \n  ").is_empty());
        assert!(parse_numbered_list("No list here, just prose.").is_empty());
    }

    #[test]
    fn test_blank_line_terminates_item() {
        let text = "1. Lime\n\nSome commentary\n2. Spin";
        assert_eq!(parse_numbered_list(text), vec!["Lime", "Spin"]);
    }

    #[test]
    fn test_same_input_same_output() {
        let text = "1. Bird\n2. Tier\n3. Voi";
        assert_eq!(parse_numbered_list(text), parse_numbered_list(text));
    }
}
