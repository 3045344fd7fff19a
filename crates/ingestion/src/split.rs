//! Quote-aware splitting of a single delimited line.

use csv::{ReaderBuilder, StringRecord};

/// Split one line on `delimiter`, honoring double-quoted fields.
///
/// Delimiters inside quotes are kept and a doubled quote is a literal quote.
pub fn split_line(line: &str, delimiter: u8) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(str::to_string).collect(),
        Ok(false) => vec![String::new()],
        Err(_) => vec![line.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_delimiter_preserved() {
        assert_eq!(split_line(r#"a,"b,c",d"#, b','), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn test_doubled_quote_is_literal() {
        assert_eq!(
            split_line(r#"x;"say ""hi""";z"#, b';'),
            vec!["x", r#"say "hi""#, "z"]
        );
    }

    #[test]
    fn test_trailing_delimiter_keeps_empty_field() {
        assert_eq!(split_line("a;b;", b';'), vec!["a", "b", ""]);
    }

    #[test]
    fn test_other_delimiter_ignored() {
        assert_eq!(split_line("1,5;2,5", b';'), vec!["1,5", "2,5"]);
    }
}
