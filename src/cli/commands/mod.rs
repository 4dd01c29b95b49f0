//! CLI command implementations.

mod analytics;
mod config;
mod generate;
mod import;
mod init;
mod list;
mod questions;
mod reset;
mod serve;

pub use analytics::run_analytics;
pub use config::run_config;
pub use generate::run_generate;
pub use import::run_import;
pub use init::run_init;
pub use list::run_list;
pub use questions::run_questions;
pub use reset::run_reset;
pub use serve::run_serve;
