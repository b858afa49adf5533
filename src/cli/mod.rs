//! CLI module for calendar-mcp - command-line interface and subcommands.
//!
//! With no subcommand the binary serves MCP over stdio; the other
//! subcommands inspect the catalog or run a single tool from a shell.

pub mod commands;

pub use commands::Cli;
