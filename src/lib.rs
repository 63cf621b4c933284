pub mod analyzer;
pub mod arxiv;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notifier;
pub mod retry;
pub mod scoring;
pub mod watermark;
