use super::state::{SuiteStatus, TestSummary};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;
use tokio::sync::broadcast;

/// Test execution events for real-time updates
#[derive(Debug, Clone)]
pub enum TestEvent {
    // Session events
    SessionStarted {
        session_id: String,
    },
    SessionFinished {
        summary: TestSummary,
    },

    // Suite events
    SuiteStarted {
        suite_name: String,
        suite_path: String,
        step_count: usize,
    },
    SuiteFinished {
        suite_name: String,
        status: SuiteStatus,
        duration_ms: Option<u64>,
    },

    // Step events
    StepStarted {
        index: usize,
        title: String,
    },
    StepPassed {
        index: usize,
        duration_ms: u64,
    },
    StepFailed {
        index: usize,
        error: String,
        duration_ms: u64,
    },
    StepSkipped {
        index: usize,
        title: String,
        reason: String,
    },

    Log {
        message: String,
    },
}

/// Event emitter: prints to the console in order and broadcasts to subscribers
pub struct EventEmitter {
    sender: broadcast::Sender<TestEvent>,
    console: Option<ConsoleEventListener>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<TestEvent>) {
        let (sender, receiver) = broadcast::channel(100);
        (
            Self {
                sender,
                console: Some(ConsoleEventListener::new()),
            },
            receiver,
        )
    }

    /// Emitter without console output
    pub fn silent() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self {
            sender,
            console: None,
        }
    }

    pub fn emit(&mut self, event: TestEvent) {
        if let Some(console) = self.console.as_mut() {
            console.handle(&event);
        }
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TestEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new().0
    }
}

/// Console event listener for printing real-time updates
pub struct ConsoleEventListener {
    spinner: Option<ProgressBar>,
    step_text: String,
    is_tty: bool,
}

impl ConsoleEventListener {
    pub fn new() -> Self {
        Self {
            spinner: None,
            step_text: String::new(),
            is_tty: std::io::stdout().is_terminal(),
        }
    }

    fn finish_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    pub fn handle(&mut self, event: &TestEvent) {
        match event {
            TestEvent::SessionStarted { session_id } => {
                println!(
                    "\n{} Test session started: {}",
                    "▶".green().bold(),
                    session_id.cyan()
                );
            }

            TestEvent::SessionFinished { summary } => {
                self.finish_spinner();
                println!("\n{} Test session finished", "■".blue().bold());
                println!("  Total suites: {}", summary.total_suites);
                println!("  Total steps: {}", summary.total_steps);
                println!(
                    "  {} passed, {} failed, {} pending",
                    summary.passed.to_string().green(),
                    summary.failed.to_string().red(),
                    summary.skipped.to_string().yellow()
                );
                if let Some(duration) = summary.total_duration_ms {
                    println!("  Duration: {}ms", duration);
                }
            }

            TestEvent::SuiteStarted {
                suite_name,
                step_count,
                ..
            } => {
                println!(
                    "\n  {} Suite: {} ({} steps)",
                    "→".blue(),
                    suite_name.white().bold(),
                    step_count
                );
            }

            TestEvent::SuiteFinished {
                suite_name,
                status,
                duration_ms,
            } => {
                self.finish_spinner();
                let status_str = match status {
                    SuiteStatus::Passed => "PASSED".green().bold(),
                    SuiteStatus::Failed => "FAILED".red().bold(),
                    SuiteStatus::PartiallyPassed { passed, failed } => {
                        format!("PARTIAL ({}/{} passed)", passed, passed + failed)
                            .yellow()
                            .bold()
                    }
                    SuiteStatus::Skipped => "SKIPPED".yellow().bold(),
                    _ => "UNKNOWN".white().bold(),
                };
                println!("  {} Suite {} [{}]", "←".blue(), suite_name, status_str);
                if let Some(duration) = duration_ms {
                    println!("    Duration: {}ms", duration);
                }
            }

            TestEvent::StepStarted { index, title } => {
                self.finish_spinner();
                self.step_text = format!("[{}] {}... ", index, title.dimmed());

                let pb = ProgressBar::new_spinner();
                if !self.is_tty {
                    pb.set_draw_target(ProgressDrawTarget::hidden());
                }
                if let Ok(style) = ProgressStyle::default_spinner()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                    .template("    {spinner} {msg}")
                {
                    pb.set_style(style);
                }
                pb.set_message(self.step_text.clone());
                pb.enable_steady_tick(Duration::from_millis(100));
                self.spinner = Some(pb);
            }

            TestEvent::StepPassed { duration_ms, .. } => {
                self.finish_spinner();
                println!("    {} {}({}ms)", "✓".green(), self.step_text, duration_ms);
            }

            TestEvent::StepFailed {
                error, duration_ms, ..
            } => {
                self.finish_spinner();
                println!("    {} {}({}ms)", "✗".red(), self.step_text, duration_ms);
                println!("      {}", error.red());
            }

            TestEvent::StepSkipped {
                index,
                title,
                reason,
            } => {
                self.finish_spinner();
                println!(
                    "    {} [{}] {} ({})",
                    "○".yellow(),
                    index,
                    title.dimmed(),
                    reason.dimmed()
                );
            }

            TestEvent::Log { message } => {
                if let Some(pb) = &self.spinner {
                    pb.println(format!("      {}", message));
                } else {
                    println!("      {}", message);
                }
            }
        }
    }
}

impl Default for ConsoleEventListener {
    fn default() -> Self {
        Self::new()
    }
}
