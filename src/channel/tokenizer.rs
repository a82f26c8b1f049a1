use regex::Regex;
use std::sync::LazyLock;

// Matches one token: a double-quoted segment (backslash escapes kept
// as-is) or a bare word with no whitespace. Scanning skips anything
// between tokens, so malformed input degrades instead of failing.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(?:[^"\\]|\\.)*"|[^\s"]\S*"#).unwrap());

/// Split a raw inbound chunk into command tokens.
///
/// The first token is the command name, the rest are its arguments.
/// Quoted tokens have their surrounding quotes stripped; interior
/// backslash sequences are not unescaped.
pub fn tokenize(raw: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(raw)
        .map(|m| {
            let tok = m.as_str();
            if tok.len() >= 2 && tok.starts_with('"') && tok.ends_with('"') {
                tok[1..tok.len() - 1].to_string()
            } else {
                tok.to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_bare_words() {
        assert_eq!(tokenize("open file.rs 12"), vec!["open", "file.rs", "12"]);
    }

    #[test]
    fn quoted_token_keeps_embedded_spaces() {
        assert_eq!(tokenize(r#"foo "bar baz" 3"#), vec!["foo", "bar baz", "3"]);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t  \n").is_empty());
    }

    #[test]
    fn leading_whitespace_is_skipped() {
        assert_eq!(tokenize("   visit  a.txt"), vec!["visit", "a.txt"]);
    }

    #[test]
    fn escaped_quote_inside_quoted_token_is_kept_verbatim() {
        assert_eq!(tokenize(r#"msg "say \"hi\"""#), vec!["msg", r#"say \"hi\""#]);
    }

    #[test]
    fn empty_quoted_token_becomes_empty_string() {
        assert_eq!(tokenize(r#"set "" x"#), vec!["set", "", "x"]);
    }

    #[test]
    fn newlines_separate_tokens_like_spaces() {
        assert_eq!(tokenize("a\nb\nc"), vec!["a", "b", "c"]);
    }
}
