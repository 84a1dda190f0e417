// Spoiler confirmation — the expensive remote stage.
//
// The confirmation service asks a language model whether a text spoils one
// of the candidate titles and answers in plain text: a boolean literal,
// optionally followed by a delimiter and the matched title, e.g.
// "True {/ Origin" or "false". Anything without a boolean prefix is a
// parse failure, never a silent "no".

use async_trait::async_trait;

use crate::error::DetectionError;

/// The confirmation stage's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub is_spoiler: bool,
    pub matched_title: Option<String>,
}

/// Trait for remote spoiler confirmation.
#[async_trait]
pub trait SpoilerConfirmer: Send + Sync {
    async fn confirm(
        &self,
        text: &str,
        title_names: &[String],
    ) -> Result<Confirmation, DetectionError>;
}

/// Parse a boolean-prefixed confirmation reply.
///
/// The title suffix is best-effort: if it is missing or contains nothing
/// alphanumeric, `matched_title` is `None`.
pub fn parse_confirmation(body: &str) -> Result<Confirmation, DetectionError> {
    // Some deployments JSON-encode the string reply
    let trimmed = body.trim().trim_matches('"').trim();

    let split = trimmed
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (head, rest) = trimmed.split_at(split);

    let is_spoiler = match head.to_ascii_lowercase().as_str() {
        "true" => true,
        "false" => false,
        _ => {
            return Err(DetectionError::Parse(format!(
                "confirmation reply has no boolean prefix: {:?}",
                crate::output::truncate_chars(trimmed, 60)
            )))
        }
    };

    let title = rest
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '}' | '"' | '\''));
    let matched_title = (!title.is_empty()).then(|| title.to_string());

    Ok(Confirmation {
        is_spoiler,
        matched_title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_with_braced_title() {
        let c = parse_confirmation("True {/ Origin").unwrap();
        assert!(c.is_spoiler);
        assert_eq!(c.matched_title.as_deref(), Some("Origin"));
    }

    #[test]
    fn false_without_title() {
        let c = parse_confirmation("False").unwrap();
        assert!(!c.is_spoiler);
        assert!(c.matched_title.is_none());
    }

    #[test]
    fn case_insensitive_and_quoted() {
        let c = parse_confirmation("\"TRUE, The Matrix\"\n").unwrap();
        assert!(c.is_spoiler);
        assert_eq!(c.matched_title.as_deref(), Some("The Matrix"));
    }

    #[test]
    fn malformed_suffix_is_tolerated() {
        let c = parse_confirmation("true {/ }").unwrap();
        assert!(c.is_spoiler);
        assert!(c.matched_title.is_none());
    }

    #[test]
    fn title_with_trailing_parenthesis_is_kept() {
        let c = parse_confirmation("true | Dune (2021)").unwrap();
        assert_eq!(c.matched_title.as_deref(), Some("Dune (2021)"));
    }

    #[test]
    fn missing_boolean_is_parse_error() {
        assert!(matches!(
            parse_confirmation("maybe Origin"),
            Err(DetectionError::Parse(_))
        ));
        assert!(matches!(parse_confirmation(""), Err(DetectionError::Parse(_))));
        // "trueish" is not a boolean literal
        assert!(parse_confirmation("trueish").is_err());
    }
}
