use crate::{Flow, WorkflowError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const EXPORT_VERSION: &str = "2.0";

/// Versioned envelope used when a flow is saved or shared
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub canvas_data: Flow,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AgentConfig {
    pub fn export(flow: &Flow, metadata: Option<Map<String, Value>>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            exported_at: Utc::now(),
            canvas_data: flow.clone(),
            metadata: metadata.unwrap_or_default(),
        }
    }
}

/// A flow saved under a name for later runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAgent {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub canvas_data: Flow,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_agent_version")]
    pub version: String,
}

fn default_agent_version() -> String {
    "1.0".to_string()
}

impl SavedAgent {
    pub fn new(name: impl Into<String>, canvas_data: Flow) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            canvas_data,
            created_at: Utc::now(),
            version: default_agent_version(),
        }
    }
}

/// Read a flow from either a bare canvas document or an export envelope.
pub fn import_flow(json: &str) -> Result<Flow, WorkflowError> {
    let document: Value = serde_json::from_str(json)
        .map_err(|e| WorkflowError::InvalidConfig(format!("Invalid JSON data: {}", e)))?;

    let canvas = match document.get("canvas_data") {
        Some(canvas) => canvas,
        None if document.get("nodes").is_some() => &document,
        None => {
            return Err(WorkflowError::InvalidConfig(
                "Missing required field: canvas_data".to_string(),
            ))
        }
    };

    let Some(object) = canvas.as_object() else {
        return Err(WorkflowError::InvalidConfig(
            "Invalid canvas_data format".to_string(),
        ));
    };
    if !object.contains_key("nodes") || !object.contains_key("connections") {
        return Err(WorkflowError::InvalidConfig(
            "Canvas data missing nodes or connections".to_string(),
        ));
    }

    Flow::deserialize(canvas)
        .map_err(|e| WorkflowError::InvalidConfig(format!("Invalid canvas data: {}", e)))
}
