//! Regex heuristic for top-of-line assignments.
//!
//! Matches a bare identifier at the start of a line, `=`, and a value that is a
//! triple-quoted string (either quote style), a parenthesized expression, or the
//! rest of the line. Matching is lazy inside triple quotes and greedy everywhere
//! else, so degenerate inputs (an `=` inside a string starting a line, several
//! statements on one line) may over- or under-match. Callers get the raw matches.

use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?ms)^(\w+\s*=\s*(?:""".*?"""|'''.*?'''|\([^)]*\)|[^\n]+))"#).unwrap()
});

/// Extract the literal text of every top-of-line assignment, in file order
pub fn extract_identifiers(code: &str) -> Vec<String> {
    IDENTIFIER_RE
        .find_iter(code)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_assignment() {
        let code = "X = \"hello\"\ndef f():\n    return 1\n";
        assert_eq!(extract_identifiers(code), vec!["X = \"hello\""]);
    }

    #[test]
    fn test_file_order_preserved() {
        let code = "A = 1\nB=2\nC   =   [1, 2, 3]\n";
        assert_eq!(
            extract_identifiers(code),
            vec!["A = 1", "B=2", "C   =   [1, 2, 3]"]
        );
    }

    #[test]
    fn test_triple_double_quoted_multiline() {
        let code = "PROMPT = \"\"\"You are\na helper.\n\"\"\"\nNEXT = 1\n";
        assert_eq!(
            extract_identifiers(code),
            vec!["PROMPT = \"\"\"You are\na helper.\n\"\"\"", "NEXT = 1"]
        );
    }

    #[test]
    fn test_triple_single_quoted_multiline() {
        let code = "DOC = '''first\nsecond'''\n";
        assert_eq!(extract_identifiers(code), vec!["DOC = '''first\nsecond'''"]);
    }

    #[test]
    fn test_parenthesized_value_spans_lines() {
        let code = "PAIR = (\n    1,\n    2,\n)\nOTHER = 3\n";
        assert_eq!(
            extract_identifiers(code),
            vec!["PAIR = (\n    1,\n    2,\n)", "OTHER = 3"]
        );
    }

    #[test]
    fn test_parenthesized_value_stops_at_first_close() {
        // Heuristic: nested parentheses end the match early
        let code = "CALL = (f(1), 2)\n";
        assert_eq!(extract_identifiers(code), vec!["CALL = (f(1)"]);
    }

    #[test]
    fn test_indented_assignments_ignored() {
        let code = "def f():\n    local = 1\n    return local\n";
        assert!(extract_identifiers(code).is_empty());
    }

    #[test]
    fn test_comparison_at_line_start_over_matches() {
        // `a == b` reads as `a =` followed by `= b`; kept as the heuristic does
        let code = "a == b\n";
        assert_eq!(extract_identifiers(code), vec!["a == b"]);
    }

    #[test]
    fn test_value_on_next_line() {
        // `\s*` crosses the line break when nothing follows `=`
        let code = "VALUE =\n    42\n";
        assert_eq!(extract_identifiers(code), vec!["VALUE =\n    42"]);
    }

    #[test]
    fn test_unterminated_triple_quote_falls_back_to_line() {
        let code = "BROKEN = \"\"\"never closed\nmore\n";
        assert_eq!(
            extract_identifiers(code),
            vec!["BROKEN = \"\"\"never closed"]
        );
    }

    #[test]
    fn test_no_assignments() {
        assert!(extract_identifiers("import os\nprint(os.getcwd())\n").is_empty());
        assert!(extract_identifiers("").is_empty());
    }
}
