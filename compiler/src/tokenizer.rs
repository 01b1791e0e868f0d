use lazy_static::lazy_static;
use regex::Regex;

use crate::error::StitchError;
use crate::utils::{parse_error, quote};

lazy_static! {
    pub static ref TOKEN_REGEX:   Regex = Regex::new(
        r#"((?:-|\b)\d+(?:\.\d+)?\b|"[^"\n]*"|[=;{}\[\],]|\b[A-Za-z_][A-Za-z0-9_.]*|//[^\n]*|\s+)"#
    ).unwrap();
    pub static ref WHITESPACE_RX: Regex = Regex::new(r"^(//[^\n]*|\s+)$").unwrap();
}

#[derive(Debug, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

/// Splits schema text into tokens, tracking line/column for diagnostics.
/// Comments and whitespace are dropped; a trailing empty token marks EOF.
pub fn tokenize_schema(text: &str) -> Result<Vec<Token>, StitchError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for mat in TOKEN_REGEX.find_iter(text) {
        let start = mat.start();
        let end   = mat.end();
        let part  = mat.as_str();

        if start > last_end {
            // Unexpected text between last_end and start
            let unexpected = &text[last_end..start];
            return Err(parse_error(
                &format!("Syntax error: {}", quote(unexpected)),
                line,
                column,
            ));
        }

        if !WHITESPACE_RX.is_match(part) && !part.starts_with("//") {
            tokens.push(Token {
                text:   part.to_string(),
                line,
                column,
            });
        }

        // Update line/column
        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.len() + 1;
            }
        } else {
            column += part.len();
        }

        last_end = end;
    }

    if last_end != text.len() {
        let unexpected = &text[last_end..];
        return Err(parse_error(
            &format!("Syntax error: {}", quote(unexpected)),
            line,
            column,
        ));
    }

    // Append EOF token
    tokens.push(Token {
        text:   "".to_string(),
        line,
        column,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_field_declaration() {
        let input = "optional int32 x = 10;";
        let expected = vec![
            Token { text: "optional".into(), line: 1, column: 1 },
            Token { text: "int32".into(),    line: 1, column: 10 },
            Token { text: "x".into(),        line: 1, column: 16 },
            Token { text: "=".into(),        line: 1, column: 18 },
            Token { text: "10".into(),       line: 1, column: 20 },
            Token { text: ";".into(),        line: 1, column: 22 },
            Token { text: "".into(),         line: 1, column: 23 },
        ];
        let got = tokenize_schema(input).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_tokenize_dotted_reference() {
        let input = "optional p.Other.Nested thing = 1;";
        let got = tokenize_schema(input).unwrap();
        assert_eq!(got[1].text, "p.Other.Nested");
    }

    #[test]
    fn test_tokenize_string_literal_and_comment() {
        let input = "import \"other.proto\"; // pulls in p.Other\n";
        let got = tokenize_schema(input).unwrap();
        let texts: Vec<&str> = got.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["import", "\"other.proto\"", ";", ""]);
    }

    #[test]
    fn test_tokenize_bracketed_options() {
        let input = "[packed = true, default = -3]";
        let got = tokenize_schema(input).unwrap();
        let texts: Vec<&str> = got.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["[", "packed", "=", "true", ",", "default", "=", "-3", "]", ""]
        );
    }

    #[test]
    fn test_tokenize_unexpected_text() {
        let input = "int32 x = 10 @";
        let err = tokenize_schema(input).unwrap_err();
        assert!(
            matches!(err, StitchError::ParseError { .. }),
            "expected a ParseError but got {:?}",
            err
        );
    }
}
