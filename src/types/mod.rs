pub mod config;
pub mod event;
pub mod metrics;
pub mod scoring;
