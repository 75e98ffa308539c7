//! CLI interface for arpspoof
//!
//! This crate provides the command-line interface for arpspoof,
//! including argument parsing and help text.

pub mod args;

pub use args::Cli;
