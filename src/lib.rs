pub mod analyzers;
pub mod calendar;
pub mod clean;
pub mod config;
pub mod dataset;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod services;
pub mod stats;
