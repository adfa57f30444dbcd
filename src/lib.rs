pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod page_range;
pub mod partition;
pub mod pipeline;
pub mod processor;
pub mod report;
pub mod terms;
pub mod util;
pub mod worker;
