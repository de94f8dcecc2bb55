//! Default property sets for every node type, as offered by the canvas
//! palette, plus loose checks of user-edited properties against them.

use crate::{NodeSpec, NodeType, Properties};
use serde_json::{json, Value};

/// Palette entry for one node type
#[derive(Debug, Clone)]
pub struct NodeTemplate {
    pub node_type: NodeType,
    pub label: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub properties: Properties,
    /// Properties whose template value is a list of allowed options.
    choices: Vec<&'static str>,
}

impl NodeTemplate {
    pub fn for_type(node_type: &NodeType) -> Option<NodeTemplate> {
        let (label, category, description, choices, properties) = match node_type {
            NodeType::Input => (
                "Input",
                "io",
                "User input capture with validation",
                vec!["input_type"],
                json!({
                    "input_type": ["text", "file", "voice", "structured"],
                    "validation": "",
                    "placeholder": "Enter your message...",
                    "required": true,
                    "max_length": 1000,
                    "multiline": false
                }),
            ),
            NodeType::Llm => (
                "LLM",
                "model",
                "Language model processing with advanced controls",
                vec!["model"],
                json!({
                    "model": ["gpt-4o", "gpt-4", "gpt-3.5-turbo", "gpt-4o-mini"],
                    "temperature": 0.7,
                    "max_tokens": 2000,
                    "system_prompt": "You are a helpful assistant.",
                    "stream": true,
                    "top_p": 1.0,
                    "frequency_penalty": 0.0,
                    "presence_penalty": 0.0,
                    "stop_sequences": []
                }),
            ),
            NodeType::Prompt => (
                "Prompt",
                "model",
                "Advanced prompt template engine",
                vec!["template_type"],
                json!({
                    "template": "Answer the question: {question}",
                    "variables": ["question"],
                    "template_type": ["simple", "chat", "few_shot", "chain_of_thought"],
                    "examples": [],
                    "format_instructions": ""
                }),
            ),
            NodeType::Tool => (
                "Tool",
                "integration",
                "External tools and API integrations",
                vec!["tool_type"],
                json!({
                    "tool_type": ["web_search", "calculator", "file_reader", "api_call", "database", "python_code"],
                    "endpoint": "",
                    "method": "GET",
                    "headers": {},
                    "parameters": {},
                    "timeout": 30,
                    "retry_count": 3,
                    "auth_type": "none"
                }),
            ),
            NodeType::Memory => (
                "Memory",
                "state",
                "Conversation memory and context management",
                vec!["memory_type"],
                json!({
                    "memory_type": ["conversation_buffer", "conversation_summary", "vector_store", "entity_memory"],
                    "max_tokens": 1000,
                    "return_messages": true,
                    "summary_template": "Summarize the conversation so far.",
                    "k": 5,
                    "moving_summary_buffer": 2000
                }),
            ),
            NodeType::Router => (
                "Router",
                "control",
                "Intelligent decision routing logic",
                vec!["routing_type"],
                json!({
                    "routing_type": ["semantic", "keyword", "model_based", "rule_based"],
                    "conditions": {},
                    "default_route": "",
                    "confidence_threshold": 0.8,
                    "routes": []
                }),
            ),
            NodeType::Parser => (
                "Parser",
                "transform",
                "Output parsing and structured formatting",
                vec!["parser_type"],
                json!({
                    "parser_type": ["json", "xml", "regex", "structured", "pydantic"],
                    "schema": {},
                    "format_template": "",
                    "error_handling": "strict",
                    "output_format": "dict"
                }),
            ),
            NodeType::Validator => (
                "Validator",
                "transform",
                "Input/output validation and quality control",
                vec![],
                json!({
                    "validation_rules": {},
                    "error_message": "Validation failed",
                    "strict_mode": true,
                    "auto_fix": false,
                    "validation_type": "schema"
                }),
            ),
            NodeType::Webhook => (
                "Webhook",
                "integration",
                "External webhook and API integration",
                vec!["auth_type"],
                json!({
                    "url": "",
                    "method": "POST",
                    "headers": {},
                    "auth_type": ["none", "bearer", "basic", "api_key"],
                    "timeout": 30,
                    "retry_on_failure": true,
                    "expected_status": 200
                }),
            ),
            NodeType::Output => (
                "Output",
                "io",
                "Final output formatting and delivery",
                vec!["format"],
                json!({
                    "format": ["text", "json", "html", "markdown"],
                    "template": "",
                    "post_process": false,
                    "save_to_file": false,
                    "file_path": ""
                }),
            ),
            NodeType::Unknown(_) => return None,
        };

        let properties = match properties {
            Value::Object(map) => map,
            _ => Properties::new(),
        };

        Some(NodeTemplate {
            node_type: node_type.clone(),
            label,
            category,
            description,
            properties,
            choices,
        })
    }

    pub fn all() -> Vec<NodeTemplate> {
        NodeType::ALL
            .iter()
            .filter_map(NodeTemplate::for_type)
            .collect()
    }

    /// A fresh node carrying this template's default properties
    pub fn instantiate(&self) -> NodeSpec {
        let mut node = NodeSpec::new(self.node_type.clone());
        node.properties = self.properties.clone();
        node
    }

    pub fn is_choice(&self, property: &str) -> bool {
        self.choices.iter().any(|choice| *choice == property)
    }

    /// Check a node's properties against this template. Returns one message
    /// per problem; an empty list means nothing looked wrong.
    pub fn check(&self, properties: &Properties) -> Vec<String> {
        let mut problems = Vec::new();

        for (name, value) in properties {
            let Some(expected) = self.properties.get(name) else {
                problems.push(format!("Unknown property '{}' for {}", name, self.label));
                continue;
            };

            match expected {
                Value::Array(options) if self.is_choice(name) => {
                    // The untouched option list itself is fine.
                    if value.is_array() {
                        continue;
                    }
                    if !options.contains(value) {
                        let allowed: Vec<&str> =
                            options.iter().filter_map(Value::as_str).collect();
                        problems.push(format!(
                            "Invalid value {} for {}. Must be one of: {}",
                            value,
                            name,
                            allowed.join(", ")
                        ));
                    }
                }
                Value::Bool(_) if !value.is_boolean() => {
                    problems.push(format!("Property '{}' must be boolean", name));
                }
                Value::Number(_) if !value.is_number() => {
                    problems.push(format!("Property '{}' must be numeric", name));
                }
                _ => {}
            }
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_type_has_a_template() {
        assert_eq!(NodeTemplate::all().len(), NodeType::ALL.len());
        assert!(NodeTemplate::for_type(&NodeType::Unknown("x".into())).is_none());
    }

    #[test]
    fn test_check_flags_bad_values() {
        let template = NodeTemplate::for_type(&NodeType::Llm).unwrap();
        let mut props = Properties::new();
        props.insert("model".into(), json!("gpt-4o"));
        props.insert("temperature".into(), json!("hot"));
        props.insert("stream".into(), json!(1));
        props.insert("colour".into(), json!("blue"));

        let problems = template.check(&props);
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p.contains("'temperature' must be numeric")));
        assert!(problems.iter().any(|p| p.contains("'stream' must be boolean")));
        assert!(problems.iter().any(|p| p.contains("Unknown property 'colour'")));
    }

    #[test]
    fn test_check_rejects_value_outside_options() {
        let template = NodeTemplate::for_type(&NodeType::Parser).unwrap();
        let mut props = Properties::new();
        props.insert("parser_type".into(), json!("yaml"));
        let problems = template.check(&props);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("Invalid value \"yaml\" for parser_type"));
    }

    #[test]
    fn test_instantiated_node_passes_its_own_check() {
        for template in NodeTemplate::all() {
            let node = template.instantiate();
            assert!(template.check(&node.properties).is_empty(), "{}", template.label);
        }
    }
}
