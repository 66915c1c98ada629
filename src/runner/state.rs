use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Success rate at or above which a run counts as passing
pub const PASS_THRESHOLD: f64 = 80.0;

/// Success rate at or above which a failing run only needs attention
pub const ATTENTION_THRESHOLD: f64 = 60.0;

/// Outcome of a single test case
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    /// Failure description; absent for passing cases
    pub details: Option<String>,
    /// Observed status code; absent when the request never completed
    pub status_code: Option<u16>,
    pub duration_ms: Option<u64>,
}

impl TestResult {
    pub fn passed(name: &str, status_code: u16, duration_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            details: None,
            status_code: Some(status_code),
            duration_ms: Some(duration_ms),
        }
    }

    pub fn failed(name: &str, details: String) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            details: Some(details),
            status_code: None,
            duration_ms: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Categorical verdict derived from the success rate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Good,
    NeedsAttention,
    Critical,
}

impl Verdict {
    pub fn from_rate(success_rate: f64) -> Self {
        if success_rate >= PASS_THRESHOLD {
            Verdict::Good
        } else if success_rate >= ATTENTION_THRESHOLD {
            Verdict::NeedsAttention
        } else {
            Verdict::Critical
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Good => f.write_str("GOOD"),
            Verdict::NeedsAttention => f.write_str("NEEDS ATTENTION"),
            Verdict::Critical => f.write_str("CRITICAL ISSUES"),
        }
    }
}

/// Ordered record of every executed test case plus running counters
#[derive(Debug, Clone)]
pub struct ResultLog {
    pub session_id: String,
    results: Vec<TestResult>,
    tests_run: u32,
    tests_passed: u32,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    aborted: Option<String>,
}

impl ResultLog {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            results: Vec::new(),
            tests_run: 0,
            tests_passed: 0,
            started_at: None,
            finished_at: None,
            aborted: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
    }

    /// Append a result and bump the counters
    pub fn record(&mut self, result: TestResult) {
        self.tests_run += 1;
        if result.success {
            self.tests_passed += 1;
        }
        self.results.push(result);
    }

    pub fn abort(&mut self, reason: &str) {
        self.aborted = Some(reason.to_string());
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn tests_run(&self) -> u32 {
        self.tests_run
    }

    pub fn tests_passed(&self) -> u32 {
        self.tests_passed
    }

    pub fn summary(&self) -> TestSummary {
        let total_duration_ms = self.started_at.map(|start| {
            self.finished_at
                .unwrap_or_else(Instant::now)
                .duration_since(start)
                .as_millis() as u64
        });

        let mut summary = TestSummary::from_results(&self.session_id, &self.results);
        summary.aborted = self.aborted.clone();
        summary.total_duration_ms = total_duration_ms;
        summary
    }
}

/// Tallied outcome of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub session_id: String,
    pub tests_run: u32,
    pub tests_passed: u32,
    pub tests_failed: u32,
    pub success_rate: f64,
    pub verdict: Verdict,
    pub aborted: Option<String>,
    pub total_duration_ms: Option<u64>,
}

impl TestSummary {
    /// Rebuild the tallies from a result list alone
    pub fn from_results(session_id: &str, results: &[TestResult]) -> Self {
        let tests_run = results.len() as u32;
        let tests_passed = results.iter().filter(|r| r.success).count() as u32;
        let success_rate = success_rate(tests_passed, tests_run);

        Self {
            session_id: session_id.to_string(),
            tests_run,
            tests_passed,
            tests_failed: tests_run - tests_passed,
            success_rate,
            verdict: Verdict::from_rate(success_rate),
            aborted: None,
            total_duration_ms: None,
        }
    }

    /// A run passes when it was not aborted and met the threshold
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.success_rate >= PASS_THRESHOLD
    }
}

pub fn success_rate(passed: u32, run: u32) -> f64 {
    if run == 0 {
        0.0
    } else {
        passed as f64 / run as f64 * 100.0
    }
}
