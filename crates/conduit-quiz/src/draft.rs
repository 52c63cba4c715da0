use serde::Deserialize;

use crate::error::QuizError;

/// Unvalidated quiz data as produced by the text backend
///
/// Every field is optional on the wire; missing fields become empty and
/// are judged by [`crate::normalize`], not by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QuizDraft {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, alias = "correctAnswer")]
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

/// Parse backend text into a draft, tolerating a surrounding code fence
///
/// # Errors
///
/// Returns `QuizError::MalformedOutput` if the text is not a JSON object
/// of the expected shape
pub fn parse_draft(text: &str) -> Result<QuizDraft, QuizError> {
    serde_json::from_str(strip_code_fence(text)).map_err(|e| QuizError::MalformedOutput(e.to_string()))
}

/// Remove a leading ```` ```json ```` (any info string) or ```` ``` ```` line and a trailing ```` ``` ````
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (`json`, `Json`, `javascript`, ...) up to the first newline
    let body = match rest.split_once('\n') {
        Some((info, body)) if info.trim().chars().all(|c| c.is_ascii_alphanumeric()) => body,
        _ => rest
            .get(..4)
            .filter(|info| info.eq_ignore_ascii_case("json"))
            .map_or(rest, |_| &rest[4..]),
    };

    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_parses() {
        let draft = parse_draft(
            r#"{"question": "Capital of France?", "options": ["Paris", "Rome"], "correct_answer": "Paris", "explanation": "It is."}"#,
        )
        .unwrap();

        assert_eq!(draft.question, "Capital of France?");
        assert_eq!(draft.options, ["Paris", "Rome"]);
        assert_eq!(draft.correct_answer, "Paris");
        assert_eq!(draft.explanation, "It is.");
    }

    #[test]
    fn fenced_json_parses() {
        let text = "```json\n{\"question\": \"Q\", \"options\": [\"a\"], \"correct_answer\": \"a\", \"explanation\": \"\"}\n```";
        assert_eq!(parse_draft(text).unwrap().correct_answer, "a");

        let text = "```\n{\"question\": \"Q\", \"options\": [], \"correct_answer\": \"b\"}\n```\n";
        assert_eq!(parse_draft(text).unwrap().correct_answer, "b");
    }

    #[test]
    fn camel_case_answer_is_accepted() {
        let draft = parse_draft(r#"{"question": "Q", "options": ["x"], "correctAnswer": "x"}"#).unwrap();
        assert_eq!(draft.correct_answer, "x");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let draft = parse_draft("{}").unwrap();
        assert_eq!(draft, QuizDraft::default());
    }

    #[test]
    fn refusal_is_malformed() {
        let err = parse_draft("Sorry, I can't answer that.").unwrap_err();
        assert!(matches!(err, QuizError::MalformedOutput(_)));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let err = parse_draft(r#"{"question": "Q", "options": "a, b, c"}"#).unwrap_err();
        assert!(matches!(err, QuizError::MalformedOutput(_)));

        let err = parse_draft(r#"["not", "an", "object"]"#).unwrap_err();
        assert!(matches!(err, QuizError::MalformedOutput(_)));
    }

    #[test]
    fn fence_stripping_leaves_plain_text_alone() {
        assert_eq!(strip_code_fence("  {\"a\": 1}\n"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```{}```"), "{}");
        assert_eq!(strip_code_fence("```json{}```"), "{}");
    }

    #[test]
    fn any_fence_info_string_is_dropped() {
        let body = "{\"question\": \"Q\", \"options\": [\"a\"], \"correct_answer\": \"a\"}";

        for info in ["Json", "JSON", "json5", "javascript", ""] {
            let text = format!("```{info}\n{body}\n```");
            assert_eq!(parse_draft(&text).unwrap().correct_answer, "a", "info string {info:?}");
        }
    }
}
