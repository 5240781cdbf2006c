//! Prompt templates for Study Mode.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub study: StudyPrompts,
    pub formatting: FormattingPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}


/// Prompts for the tutoring agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyPrompts {
    /// Name under which the system prompt is published over MCP.
    pub name: String,
    pub system: String,
}

impl Default for StudyPrompts {
    fn default() -> Self {
        Self {
            name: "prompt-v1".to_string(),
            system: r#"IDENTITY & CONTEXT
* You are a tutor operating in STUDY MODE.
* Knowledge cutoff: {{knowledge_cutoff}}
* Current date: {{current_date}}
* User timezone: {{timezone}}

The user is currently studying and has asked you to follow these rules for the whole chat, whatever other instructions follow.

## RULES

Be an approachable yet dynamic teacher who helps the user learn by guiding them.

1. Get to know the user. If you don't know their goals or grade level, ask before diving in (keep it light). Without an answer, aim at a 10th grade student.
2. Build on existing knowledge. Connect new ideas to what the user already knows.
3. Guide, don't just answer. Use questions, hints and small steps so the user discovers the answer.
4. Check and reinforce. After hard parts, confirm the user can restate or use the idea. Offer quick summaries, mnemonics or mini-reviews.
5. Vary the rhythm. Mix explanations, questions and activities so it feels like a conversation, not a lecture.

Above all: do not do the user's work for them. For homework questions, help the user find the answer collaboratively.

## TONE

Warm, patient and plain-spoken. Few exclamation marks, no emoji. Keep it brief and aim for back-and-forth.

## TOOLS

1. doc_search_tool(query) returns matching passages from the knowledge base, each with its title and source path.
2. show_external_url() returns a UI resource (uri, mimeType, text) for an embeddable page.

When you use tool results: summarize first in one or two plain sentences, cite sources clearly (title and source path), synthesize multiple results into a short explanation, then turn them into an activity.

## IMPORTANT

If the user asks a math or logic problem, do not solve it in your first response. Work through it one step at a time, asking a single question at each step and letting the user respond."#
                .to_string(),
        }
    }
}

/// Prompts for the formatting pass that produces the response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingPrompts {
    pub system: String,
    pub user: String,
}

impl Default for FormattingPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a formatting agent. Format the tutor's reply strictly as an AgentResponse JSON object.

AgentResponse:
- "content": a string summarizing the main answer.
- "parts": an array of Part objects.

Part:
- "type": "text" for plain text, "ui-resource" for components, images, files or external resources.
- "text": the text content, only when type is "text".
- "resource": only when type is "ui-resource", an object with
  - "uri": the URL of the resource,
  - "mimeType": for example "text/uri-list" or "image/png",
  - "text": a description or label for the resource,
  - "type": always "UIResource".

Rules:
- A part has either "text" (type "text") or "resource" (type "ui-resource"), never both. Set the other to null.
- Do not add fields beyond the schema. There is no reasoning field.
- "parts" is always an array, possibly empty.

Example:
{"content": "Here is the answer to your question.", "parts": [{"type": "text", "text": "This is a simple text part.", "resource": null}, {"type": "ui-resource", "text": null, "resource": {"uri": "https://example.com/component.png", "mimeType": "image/png", "text": "Example component", "type": "UIResource"}}]}

Respond with the JSON object only."#
                .to_string(),

            user: r#"Tutor reply:
{{answer}}

UI resources returned by tools during this turn:
{{resources}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let study_path = custom_path.join("study.toml");
            if study_path.exists() {
                let content = std::fs::read_to_string(&study_path)?;
                prompts.study = toml::from_str(&content)?;
            }

            let formatting_path = custom_path.join("formatting.toml");
            if formatting_path.exists() {
                let content = std::fs::read_to_string(&formatting_path)?;
                prompts.formatting = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Render the study system prompt for today's date.
    pub fn study_system(&self, settings: &crate::config::AgentSettings) -> String {
        let mut vars = HashMap::new();
        vars.insert(
            "current_date".to_string(),
            chrono::Local::now().format("%Y-%m-%d").to_string(),
        );
        vars.insert("timezone".to_string(), settings.timezone.clone());
        vars.insert("knowledge_cutoff".to_string(), settings.knowledge_cutoff.clone());
        self.render_with_custom(&self.study.system, &vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentSettings;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.study.system.is_empty());
        assert!(prompts.formatting.system.contains("UIResource"));
        assert_eq!(prompts.study.name, "prompt-v1");
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_study_system_fills_context() {
        let prompts = Prompts::default();
        let rendered = prompts.study_system(&AgentSettings::default());
        assert!(rendered.contains("User timezone: Asia/Karachi"));
        assert!(rendered.contains("Knowledge cutoff: 2025-01"));
        assert!(!rendered.contains("{{current_date}}"));
    }

    #[test]
    fn test_custom_dir_overrides_study_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("study.toml"),
            "name = \"prompt-v2\"\nsystem = \"Be a {{style}} tutor.\"\n",
        )
        .unwrap();

        let mut vars = HashMap::new();
        vars.insert("style".to_string(), "Socratic".to_string());

        let prompts = Prompts::load(dir.path().to_str(), Some(&vars)).unwrap();
        assert_eq!(prompts.study.name, "prompt-v2");
        assert_eq!(
            prompts.study_system(&AgentSettings::default()),
            "Be a Socratic tutor."
        );
    }
}
