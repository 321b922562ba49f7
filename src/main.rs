use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use zephyr_api_tester::utils::config::DEFAULT_CONFIG_PATH;
use zephyr_api_tester::{report, runner};

#[derive(Parser)]
#[command(name = "zephyr-api-tester")]
#[command(version = "0.1.0")]
#[command(about = "API test runner with Zephyr Scale result synchronisation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run test suite file(s) or directory
    Run {
        /// Path to suite file or directory
        path: PathBuf,

        /// Config file with API and Zephyr settings
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Output directory for reports
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Keep running the steps of a suite after one failed
        #[arg(long, default_value = "false")]
        continue_on_failure: bool,

        /// Generate reports (JSON, JUnit)
        #[arg(long, default_value = "false")]
        report: bool,

        /// Filter suites by tags (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },

    /// Generate report from test results
    Report {
        /// Path to test results JSON
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
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            path,
            config,
            output,
            continue_on_failure,
            report,
            tags,
        } => {
            println!(
                "{} Running tests from: {}",
                "▶".green().bold(),
                path.display()
            );
            println!("  Config: {}", config.display().to_string().cyan());
            if let Some(ref tags_list) = tags {
                println!("  Tags: {}", tags_list.join(", ").yellow());
            }
            println!("  Output: {}", output.display().to_string().cyan());
            if report {
                println!("  Reports: {}", "Enabled".green());
            }

            let options = runner::RunOptions {
                config_path: config,
                output,
                tags,
                report,
                continue_on_failure: continue_on_failure.then_some(true),
            };
            let summary = runner::run_tests(&path, &options).await?;

            if summary.failed > 0 {
                std::process::exit(1);
            }
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
            report::generate_report(&results, &format, output.as_deref()).await?;
        }
    }

    Ok(())
}
