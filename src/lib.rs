pub mod config;
pub mod dataset;
pub mod error;
pub mod output;
pub mod pages;
pub mod pipeline;
pub mod stats;
