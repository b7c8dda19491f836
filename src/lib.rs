pub mod driver;
pub mod error;
pub mod report;
pub mod runner;
pub mod scenarios;
pub mod utils;

// Re-export common items
pub use report::summarize_report;
pub use runner::run_harness;
pub use scenarios::{all_groups, select_groups};
