use crate::runner::state::{ResultLog, TestResult, TestSummary};
use serde::{Deserialize, Serialize};

/// Test results for report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub session_id: String,
    pub base_url: String,
    pub results: Vec<TestResult>,
    pub summary: TestSummary,
    pub generated_at: String,
}

impl TestResults {
    pub fn from_log(log: &ResultLog, base_url: &str) -> Self {
        Self {
            session_id: log.session_id.clone(),
            base_url: base_url.to_string(),
            results: log.results().to_vec(),
            summary: log.summary(),
            generated_at: chrono::Local::now().to_rfc3339(),
        }
    }
}
