pub mod config;
pub mod duplicates;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod scheduler;

#[cfg(test)]
mod test_utils;
