//! CLI command handlers, one per file.

mod download;
mod parse_id;
mod plan;

pub use download::{run_download, DownloadArgs};
pub use parse_id::run_parse_id;
pub use plan::run_plan;
