pub mod analyzers;
pub mod artifacts;
pub mod config;
pub mod dedup;
pub mod enrich;
pub mod fetch;
pub mod frame;
pub mod geometry;
pub mod infra;
pub mod loader;
pub mod outliers;
pub mod output;
pub mod parser;
pub mod services;
pub mod spatial;
