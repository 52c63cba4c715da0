use thiserror::Error;

/// Failures turning backend text into a quiz record
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    /// Backend text is not a JSON quiz object
    #[error("backend returned malformed quiz: {0}")]
    MalformedOutput(String),

    /// Draft parsed but lacks a required field
    #[error("backend returned invalid quiz: {0}")]
    Validation(String),
}
