pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluate;
pub mod intel;
pub mod output;
pub mod scoring;
