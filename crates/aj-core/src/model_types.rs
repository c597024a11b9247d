use std::fmt;
use serde::{Deserialize, Serialize};

/// Kind of remote model a definition refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    #[serde(rename = "CHECKPOINT")]
    Checkpoint,
    #[serde(rename = "LORA")]
    Adapter,
}

impl ModelType {
    /// Name for display in the CLI
    pub fn name(&self) -> &str {
        match self {
            Self::Checkpoint => "checkpoint",
            Self::Adapter => "adapter",
        }
    }

    /// Type string as reported by the model catalog
    pub fn wire_name(&self) -> &str {
        match self {
            Self::Checkpoint => "CHECKPOINT",
            Self::Adapter => "LORA",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|t| t.wire_name() == name)
    }

    /// All model types
    pub fn all() -> [ModelType; 2] {
        [Self::Checkpoint, Self::Adapter]
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A model known to the local registry. Identity is id + type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    pub model_id: String,
    pub name: String,
    pub model_type: ModelType,
    #[serde(default)]
    pub hidden: bool,
}

impl ModelDefinition {
    pub fn new(model_id: impl Into<String>, name: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            model_id: model_id.into(),
            name: name.into(),
            model_type,
            hidden: false,
        }
    }

    pub fn is(&self, model_id: &str, model_type: ModelType) -> bool {
        self.model_id == model_id && self.model_type == model_type
    }
}
