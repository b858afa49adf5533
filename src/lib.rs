//! calendar-mcp - Google Calendar v3 exposed as MCP tools
//!
//! Every tool is a declarative descriptor (method, path template, parameters,
//! body and response resources) loaded into a catalog. One dispatcher turns a
//! descriptor plus a JSON argument bag into exactly one HTTP request and hands
//! back the decoded response as text.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;

pub use error::{CalendarError, DispatchError, Result};
