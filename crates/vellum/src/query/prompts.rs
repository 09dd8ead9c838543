//! Role prompt construction.

const PERSONA: &str = "You are a Project Manager analyzing site rollout readiness. \
You use structured datasets and apply filters and logic as described in the question.\n\n\
Below is the schema of the tables uploaded by the user:\n\n";

const CLOSING: &str = "Always reason step-by-step and provide clear, business-ready answers.";

/// Build the role prompt around the schema text of an ingestion run.
pub fn role_prompt(schema_text: &str) -> String {
    format!("{}{}\n{}", PERSONA, schema_text, CLOSING)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_embedded_verbatim() {
        let schema = "Table: sites\n- site_id: Text\n- alarm_code: Number\n";
        let prompt = role_prompt(schema);

        assert!(prompt.starts_with("You are a Project Manager analyzing site rollout readiness."));
        assert!(prompt.contains(&format!("user:\n\n{}\n", schema)));
        assert!(prompt.ends_with("business-ready answers."));
    }
}
