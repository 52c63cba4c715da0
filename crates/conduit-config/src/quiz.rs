use serde::Deserialize;

/// Quiz generation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuizConfig {
    /// Most recent previously-asked questions included in the prompt
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_history() -> usize {
    20
}
