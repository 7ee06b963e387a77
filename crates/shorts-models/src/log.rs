//! Pipeline log records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage that produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Planning,
    Generating,
    Assembling,
    Thumbnail,
    Publishing,
    Done,
    Failed,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::Planning => "planning",
            PipelineStep::Generating => "generating",
            PipelineStep::Assembling => "assembling",
            PipelineStep::Thumbnail => "thumbnail",
            PipelineStep::Publishing => "publishing",
            PipelineStep::Done => "done",
            PipelineStep::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One progress record. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineLogEntry {
    pub step: PipelineStep,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_step_as_snake_case() {
        let entry = PipelineLogEntry {
            step: PipelineStep::Generating,
            message: "beat b1 ready".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["step"], "generating");
        assert!(json["timestamp"].is_string());
    }
}
