//! Color palettes for calendars and events

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Colors {
    /// Calendar palette keyed by color ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<BTreeMap<String, ColorDefinition>>,
    /// Event palette keyed by color ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<BTreeMap<String, ColorDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
}
