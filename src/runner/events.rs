use super::state::{TestSummary, Verdict};
use tokio::sync::broadcast;

/// Test execution events for real-time updates
#[derive(Debug, Clone)]
pub enum TestEvent {
    // Session events
    SessionStarted {
        session_id: String,
        base_url: String,
    },
    SessionFinished {
        summary: TestSummary,
    },
    Aborted {
        reason: String,
    },

    /// A group of related cases begins (authentication, rooms, ...)
    SectionStarted {
        title: String,
    },

    // Case events
    CaseStarted {
        index: usize,
        name: String,
        method: String,
        url: String,
    },
    CasePassed {
        index: usize,
        name: String,
        status: u16,
        duration_ms: u64,
    },
    CaseFailed {
        index: usize,
        name: String,
        error: String,
        duration_ms: u64,
    },
    CaseSkipped {
        name: String,
        reason: String,
    },

    // Log event for coordinated output
    Log {
        message: String,
    },
}

/// Event emitter for broadcasting test events
pub struct EventEmitter {
    sender: broadcast::Sender<TestEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<TestEvent>) {
        let (sender, receiver) = broadcast::channel(256);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: TestEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }
}

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration as StdDuration;

/// Console event listener for printing real-time updates.
/// Returns once every emitter is dropped.
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    pub async fn listen(mut receiver: broadcast::Receiver<TestEvent>) {
        use colored::Colorize;
        use std::io::IsTerminal;

        let interactive = std::io::stdout().is_terminal();
        let mut spinner: Option<ProgressBar> = None;
        let mut case_text = String::new();

        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    log::warn!("console listener dropped {} events", missed);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match event {
                TestEvent::SessionStarted {
                    session_id,
                    base_url,
                } => {
                    println!(
                        "\n{} Starting chat API tests: {}",
                        "▶".green().bold(),
                        base_url.cyan()
                    );
                    println!("  Session: {}", session_id.dimmed());
                    println!("{}", "=".repeat(50));
                }

                TestEvent::SectionStarted { title } => {
                    println!("\n{} {}", "→".blue(), title.white().bold());
                }

                TestEvent::CaseStarted {
                    index,
                    name,
                    method,
                    url,
                } => {
                    case_text = format!("[{}] {} {} {}", index, name, method.dimmed(), url.dimmed());

                    let pb = if interactive {
                        ProgressBar::new_spinner()
                    } else {
                        ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
                    };
                    let style = ProgressStyle::default_spinner()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .template("    {spinner} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner());
                    pb.set_style(style);
                    pb.set_message(format!("{}... ", case_text));
                    pb.enable_steady_tick(StdDuration::from_millis(100));
                    spinner = Some(pb);
                }

                TestEvent::CasePassed {
                    status,
                    duration_ms,
                    ..
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!(
                        "    {} {} -> {} ({}ms)",
                        "✓".green(),
                        case_text,
                        status.to_string().green(),
                        duration_ms
                    );
                }

                TestEvent::CaseFailed {
                    index,
                    name,
                    error,
                    duration_ms,
                } => {
                    match spinner.take() {
                        Some(pb) => pb.finish_and_clear(),
                        // Recorded without a request
                        None => case_text = format!("[{}] {}", index, name),
                    }
                    println!("    {} {} ({}ms)", "✗".red(), case_text, duration_ms);
                    println!("        {}", error.red());
                }

                TestEvent::CaseSkipped { name, reason } => {
                    println!("    {} {} ({})", "○".yellow(), name, reason.dimmed());
                }

                TestEvent::Log { message } => match &spinner {
                    Some(pb) => pb.println(format!("        {}", message)),
                    None => println!("        {}", message),
                },

                TestEvent::Aborted { reason } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!("\n{} {}", "✗".red().bold(), reason.red().bold());
                }

                TestEvent::SessionFinished { summary } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }

                    println!("\n{}", "=".repeat(50));
                    println!("{} Test Results Summary", "■".blue().bold());
                    println!("{}", "=".repeat(50));
                    println!("  Tests Run: {}", summary.tests_run);
                    println!(
                        "  Tests Passed: {}",
                        summary.tests_passed.to_string().green()
                    );
                    println!(
                        "  Tests Failed: {}",
                        summary.tests_failed.to_string().red()
                    );
                    println!("  Success Rate: {:.1}%", summary.success_rate);
                    if let Some(duration) = summary.total_duration_ms {
                        println!("  Duration: {}ms", duration);
                    }

                    let verdict = format!("Overall Status: {}", summary.verdict);
                    match summary.verdict {
                        Verdict::Good => println!("  {}", verdict.green().bold()),
                        Verdict::NeedsAttention => println!("  {}", verdict.yellow().bold()),
                        Verdict::Critical => println!("  {}", verdict.red().bold()),
                    }
                }
            }
        }
    }
}
