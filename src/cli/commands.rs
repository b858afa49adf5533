//! CLI command definitions using clap.
//!
//! - serve: MCP server on stdin/stdout (default)
//! - list: print the tool catalog
//! - describe: print one tool's MCP definition
//! - call: invoke one tool and print the result

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// calendar-mcp - Google Calendar API as MCP tools
#[derive(Parser, Debug)]
#[command(name = "calendar-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve MCP over stdin/stdout
    Serve,

    /// List catalog tools
    List {
        /// Only show tools whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Print the MCP definition of a tool
    Describe {
        /// Tool name
        tool: String,
    },

    /// Invoke a tool once and print the result
    Call {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}
