//! Argument bag: the loosely typed arguments of one tool call

use serde_json::{Map, Value};

use crate::error::DispatchError;

/// Read-only view over the arguments supplied for one invocation
#[derive(Debug, Clone, Copy)]
pub struct ArgumentBag<'a> {
    args: &'a Map<String, Value>,
}

impl<'a> ArgumentBag<'a> {
    /// Wrap a JSON value; anything but an object is rejected
    pub fn new(value: &'a Value) -> Result<Self, DispatchError> {
        match value {
            Value::Object(args) => Ok(Self { args }),
            _ => Err(DispatchError::InvalidArguments),
        }
    }

    /// Look up an argument. JSON `null` counts as absent.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.args.get(name).filter(|v| !v.is_null())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// A required string argument (path parameters). Unlike `get`, a
    /// present `null` is a type error, not an absence.
    pub fn require_str(&self, name: &str) -> Result<&'a str, DispatchError> {
        match self.args.get(name) {
            None => Err(DispatchError::MissingParameter(name.to_string())),
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(DispatchError::InvalidParameterType(name.to_string())),
        }
    }

    /// Query-string renderings of an argument; empty when absent.
    ///
    /// Arrays produce one value per element so the parameter repeats.
    pub fn query_values(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter(|v| !v.is_null())
                .map(render_scalar)
                .collect(),
            Some(value) => vec![render_scalar(value)],
        }
    }

    pub fn as_map(&self) -> &'a Map<String, Value> {
        self.args
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => render_number(n),
        other => other.to_string(),
    }
}

// Integral floats (maxResults: 10.0) render without a fraction.
fn render_number(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}
