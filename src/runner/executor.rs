use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

use super::case::TestCase;
use super::context::Session;
use super::events::{EventEmitter, TestEvent};
use super::state::{ResultLog, TestResult};
use crate::driver::traits::{ApiDriver, ApiRequest, RequestError};

/// Maximum characters of a raw body quoted in failure details
const RAW_BODY_PREVIEW: usize = 200;

/// Body of a passing response. Parsing is best-effort: a body that is not
/// JSON still passes the case and yields `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Json(Value),
    Empty,
}

impl ResponsePayload {
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => ResponsePayload::Json(value),
            Err(_) => ResponsePayload::Empty,
        }
    }

    /// Top-level field of a JSON object body
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            ResponsePayload::Json(value) => value.get(key),
            ResponsePayload::Empty => None,
        }
    }

    /// Value at a JSON pointer such as `/user/user_id`
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        match self {
            ResponsePayload::Json(value) => value.pointer(pointer),
            ResponsePayload::Empty => None,
        }
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Element count when the body is a JSON array
    pub fn array_len(&self) -> Option<usize> {
        match self {
            ResponsePayload::Json(Value::Array(items)) => Some(items.len()),
            _ => None,
        }
    }
}

/// Result of running one case, handed back to the scenario step
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub passed: bool,
    pub payload: ResponsePayload,
}

impl CaseOutcome {
    fn failed() -> Self {
        Self {
            passed: false,
            payload: ResponsePayload::Empty,
        }
    }
}

pub struct TestExecutor {
    driver: Box<dyn ApiDriver>,
    pub(crate) session: Session,
    pub(crate) log: ResultLog,
    emitter: EventEmitter,
}

impl TestExecutor {
    pub fn new(driver: Box<dyn ApiDriver>, session: Session, emitter: EventEmitter) -> Self {
        Self {
            driver,
            session,
            log: ResultLog::new(&Uuid::new_v4().to_string()),
            emitter,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn results(&self) -> &ResultLog {
        &self.log
    }

    pub(crate) fn emit(&self, event: TestEvent) {
        self.emitter.emit(event);
    }

    pub(crate) fn narrate(&self, message: String) {
        self.emitter.emit(TestEvent::Log { message });
    }

    /// Record a result without sending a request
    pub(crate) fn record(&mut self, result: TestResult) {
        let index = self.log.results().len();
        if let Some(details) = &result.details {
            self.emit(TestEvent::CaseFailed {
                index,
                name: result.name.clone(),
                error: details.clone(),
                duration_ms: result.duration_ms.unwrap_or(0),
            });
        }
        self.log.record(result);
    }

    /// Execute one test case. Always records exactly one result; transport
    /// errors become failed results instead of propagating.
    pub async fn run_test(&mut self, case: &TestCase) -> CaseOutcome {
        let index = self.log.results().len();
        let url = self.session.endpoint_url(&case.endpoint);

        self.emit(TestEvent::CaseStarted {
            index,
            name: case.name.clone(),
            method: case.method.to_string(),
            url: url.clone(),
        });

        let started = Instant::now();
        let sent = match self.build_headers(case) {
            Ok(headers) => {
                let request = ApiRequest {
                    method: case.method,
                    url,
                    headers,
                    body: case.body.clone(),
                };
                self.driver.send(request).await
            }
            Err(e) => Err(e),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                let details = format!("Request failed: {}", e);
                log::debug!("{}: {}", case.name, details);
                self.fail(index, case, details, None, duration_ms);
                return CaseOutcome::failed();
            }
        };

        if response.status != case.expected_status {
            let details = mismatch_details(case.expected_status, response.status, &response.text);
            self.fail(index, case, details, Some(response.status), duration_ms);
            return CaseOutcome::failed();
        }

        let payload = ResponsePayload::parse(&response.text);
        match &payload {
            ResponsePayload::Json(value) => {
                let preview: String = value.to_string().chars().take(RAW_BODY_PREVIEW).collect();
                self.narrate(format!("Response Data: {}...", preview));
            }
            ResponsePayload::Empty => self.narrate("No JSON response".to_string()),
        }

        self.emit(TestEvent::CasePassed {
            index,
            name: case.name.clone(),
            status: response.status,
            duration_ms,
        });
        self.log
            .record(TestResult::passed(&case.name, response.status, duration_ms));

        CaseOutcome {
            passed: true,
            payload,
        }
    }

    fn fail(
        &mut self,
        index: usize,
        case: &TestCase,
        details: String,
        status: Option<u16>,
        duration_ms: u64,
    ) {
        self.emit(TestEvent::CaseFailed {
            index,
            name: case.name.clone(),
            error: details.clone(),
            duration_ms,
        });

        let mut result = TestResult::failed(&case.name, details).with_duration(duration_ms);
        if let Some(status) = status {
            result = result.with_status(status);
        }
        self.log.record(result);
    }

    /// Default headers, bearer token when held, then caller overrides
    fn build_headers(&self, case: &TestCase) -> Result<HeaderMap, RequestError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(bearer) = self.session.bearer() {
            let value = HeaderValue::from_str(&bearer).map_err(|e| RequestError::InvalidHeader {
                name: AUTHORIZATION.to_string(),
                reason: e.to_string(),
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in &case.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| RequestError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| RequestError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

/// Failure text for a status mismatch, quoting the error body
fn mismatch_details(expected: u16, actual: u16, text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(error) => format!("Expected {}, got {}. Error: {}", expected, actual, error),
        Err(_) => {
            let preview: String = text.chars().take(RAW_BODY_PREVIEW).collect();
            format!("Expected {}, got {}. Response: {}", expected, actual, preview)
        }
    }
}
