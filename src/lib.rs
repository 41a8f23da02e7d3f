pub mod config;
pub mod dataset;
pub mod diagnostics;
pub mod discover;
pub mod load;
pub mod pipeline;
pub mod process;

#[cfg(test)]
pub(crate) mod fixtures;
