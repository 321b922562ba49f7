pub mod driver;
pub mod parser;
pub mod report;
pub mod runner;
pub mod utils;
pub mod zephyr;

// Re-export common items
pub use report::generate_report;
pub use runner::{run_tests, RunOptions};
pub use zephyr::{ZephyrAutomation, ZephyrSettings};
