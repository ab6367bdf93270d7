//! Terminal result of a pipeline run.

use serde::{Deserialize, Serialize};

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStatus {
    Success,
    Failed,
}

impl PipelineStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Success => "SUCCESS",
            PipelineStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result contract returned to the caller of a full run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub status: PipelineStatus,
    /// Local directory or remote URI holding the expanded frames.
    pub output_location: String,
}

impl PipelineResult {
    pub fn success(output_location: impl Into<String>) -> Self {
        Self {
            status: PipelineStatus::Success,
            output_location: output_location.into(),
        }
    }

    pub fn failed(output_location: impl Into<String>) -> Self {
        Self {
            status: PipelineStatus::Failed,
            output_location: output_location.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serializes_to_contract() {
        let result = PipelineResult::success("s3://bucket/prefix/123/");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "SUCCESS", "output_location": "s3://bucket/prefix/123/"})
        );

        let failed = PipelineResult::failed("");
        assert_eq!(serde_json::to_value(&failed).unwrap()["status"], "FAILED");
        assert!(!failed.is_success());
    }
}
