pub mod common;
pub mod completions;
pub mod config;
pub mod mirror;
pub mod preset;
pub mod run;
