use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use chat_api_tester::{report, runner, Config};

#[derive(Parser)]
#[command(name = "chat-api-tester")]
#[command(version)]
#[command(about = "Integration tests for the chat REST API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API scenario against a server
    Run {
        /// Server root (the API lives under <base-url>/api)
        #[arg(short, long)]
        base_url: Option<String>,

        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Per-request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Output directory for reports
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Write results.json and junit.xml to the output directory
        #[arg(long, default_value = "false")]
        report: bool,
    },

    /// Generate report from a saved results file
    Report {
        /// Path to results.json
        results: PathBuf,

        /// Output format (json, junit)
        #[arg(short, long, default_value = "junit")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            base_url,
            config,
            timeout_ms,
            output,
            report,
        } => {
            let mut settings = Config::load(config.as_deref())?;
            if let Some(url) = base_url {
                settings.base_url = url;
            }
            if let Some(timeout) = timeout_ms {
                settings.timeout_ms = timeout;
            }

            println!("  Base URL: {}", settings.base_url.cyan());
            println!("  Timeout: {}ms", settings.timeout_ms);
            if report {
                println!("  Reports: {}", output.display().to_string().cyan());
            }

            let passed = runner::run_tests(&settings, &output, report).await?;
            Ok(if passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".to_string().blue(),
                format.cyan(),
                results.display()
            );
            report::generate_report(&results, &format, output.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
