// crates/divvy-cli/src/commands/mod.rs
//
// Command module declarations for the Divvy CLI.

pub mod config;
pub mod replay;
