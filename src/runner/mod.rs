pub mod case;
pub mod context;
pub mod events;
pub mod executor;
pub mod scenario;
pub mod state;

use anyhow::Result;
use std::path::Path;

pub use context::Session;
pub use events::*;
pub use executor::TestExecutor;
pub use scenario::ScenarioOptions;
pub use state::*;

use crate::driver::http::HttpDriver;
use crate::report::{self, types::TestResults};
use crate::utils::config::Config;

/// Run the chat API scenario against the configured server.
/// Returns whether the run met the pass threshold.
pub async fn run_tests(config: &Config, output: &Path, write_report: bool) -> Result<bool> {
    let driver = HttpDriver::new(config.timeout())?;
    let session = Session::new(&config.base_url, &config.api_prefix);
    log::info!("testing {} (timeout {}ms)", session.api_url, config.timeout_ms);

    let (emitter, receiver) = EventEmitter::new();
    let listener = tokio::spawn(ConsoleEventListener::listen(receiver));

    let mut executor = TestExecutor::new(Box::new(driver), session, emitter);
    let summary = executor.run_all(&ScenarioOptions::from_config(config)).await;
    let results = TestResults::from_log(executor.results(), &config.base_url);

    // Dropping the executor closes the event channel so the listener drains and exits
    drop(executor);
    if let Err(e) = listener.await {
        log::warn!("console listener stopped early: {}", e);
    }

    if write_report {
        report::write_reports(&results, output)?;
    }

    Ok(summary.is_success())
}
