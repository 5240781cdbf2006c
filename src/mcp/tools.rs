//! MCP tool and prompt definitions.

use super::protocol::{Prompt, Tool};
use crate::agent::tool_definitions;
use serde_json::json;

/// Get all available tools, as advertised to the study agent.
pub fn get_tools() -> Vec<Tool> {
    tool_definitions()
        .into_iter()
        .map(|tool| Tool {
            name: tool.function.name,
            description: tool.function.description.unwrap_or_default(),
            input_schema: tool
                .function
                .parameters
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
        })
        .collect()
}

/// Get all available prompts.
pub fn get_prompts(study_prompt_name: &str) -> Vec<Prompt> {
    vec![Prompt {
        name: study_prompt_name.to_string(),
        description: "Study mode system prompt for the tutoring agent".to_string(),
        arguments: Vec::new(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_mirror_agent_tools() {
        let names: Vec<String> = get_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["doc_search_tool", "show_external_url"]);
    }
}
