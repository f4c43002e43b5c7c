//! Command-Line Interface

pub mod commands;
