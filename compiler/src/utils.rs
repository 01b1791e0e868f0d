use crate::error::StitchError;

pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn parse_error(msg: &str, line: usize, column: usize) -> StitchError {
    StitchError::ParseError {
        msg: msg.to_string(),
        line,
        column,
    }
}

/// Strips the last dot-segment of a dotted Java name, or returns `""` when
/// there is nothing left to strip.
pub fn remove_trailing_segment(name: &str) -> &str {
    match name.rfind('.') {
        Some(index) => &name[..index],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_trailing_segment() {
        assert_eq!(remove_trailing_segment("a.b.c"), "a.b");
        assert_eq!(remove_trailing_segment("a"), "");
        assert_eq!(remove_trailing_segment(""), "");
    }
}
