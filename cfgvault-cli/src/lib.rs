//! cfgvault service-mode library target.
//!
//! The binary entry point is in `main.rs`; argument parsing and command
//! dispatch live here so `tests/*.rs` can drive them without a process.

pub mod cli;
pub mod commands;
pub mod util;
