pub mod config;
pub mod logging;

pub mod control;
pub mod crop;
pub mod downloader;
pub mod encoder;
pub mod error;
pub mod events;
pub mod job;
pub mod manifest;
pub mod resolver;
pub mod retry;
pub mod scheduler;
pub mod video;
pub mod workspace;
