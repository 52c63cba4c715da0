/// Build the quiz generation prompt for a topic
///
/// Only the first `max_history` entries of `history` (most recent first)
/// are listed as questions to avoid.
pub fn build_prompt(topic: &str, history: &[String], max_history: usize) -> String {
    let mut prompt = format!(
        "Create one multiple-choice quiz question about \"{topic}\".\n\
         Give exactly four answer options, exactly one of which is correct.\n\
         Respond with a single JSON object and nothing else, using these keys:\n\
         \"question\" (string), \"options\" (array of four strings), \
         \"correct_answer\" (string, identical to one of the options), \
         \"explanation\" (string, why the answer is correct).\n"
    );

    let recent: Vec<&str> = history
        .iter()
        .map(|question| question.trim())
        .filter(|question| !question.is_empty())
        .take(max_history)
        .collect();

    if !recent.is_empty() {
        prompt.push_str("\nDo not repeat or rephrase any of these previously asked questions:\n");
        for question in recent {
            prompt.push_str(&format!("- {question}\n"));
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_topic_and_keys() {
        let prompt = build_prompt("volcanoes", &[], 20);

        assert!(prompt.contains("\"volcanoes\""));
        for key in ["\"question\"", "\"options\"", "\"correct_answer\"", "\"explanation\""] {
            assert!(prompt.contains(key), "missing {key}");
        }
        assert!(!prompt.contains("previously asked"));
    }

    #[test]
    fn history_is_capped() {
        let history: Vec<String> = (0..30).map(|i| format!("Question {i}?")).collect();
        let prompt = build_prompt("history", &history, 20);

        assert!(prompt.contains("- Question 0?"));
        assert!(prompt.contains("- Question 19?"));
        assert!(!prompt.contains("- Question 20?"));
    }

    #[test]
    fn blank_history_entries_are_skipped() {
        let history = vec!["  ".to_string(), "What is lava?".to_string()];
        let prompt = build_prompt("volcanoes", &history, 1);

        assert!(prompt.contains("- What is lava?"));
    }

    #[test]
    fn history_is_listed_one_question_per_line() {
        let history = vec!["What is lava?".to_string(), "What is magma?".to_string()];
        let prompt = build_prompt("volcanoes", &history, 20);

        assert!(prompt.ends_with(
            "previously asked questions:\n- What is lava?\n- What is magma?\n"
        ));
    }
}
