//! Tool System - descriptors and the catalog they are loaded into

mod catalog;
mod definition;

pub use catalog::ToolCatalog;
pub use definition::{BodyField, HttpMethod, ParamType, PathParam, QueryParam, ToolDescriptor};
