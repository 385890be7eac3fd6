//! Serializers for schemas, host state and check reports.
//!
//! Two formats are supported:
//! - **JSON** ([`json`]): machine-readable output built with `serde_json`
//! - **Text** ([`text`]): aligned plain-text tables for terminals

pub mod json;
pub mod text;

use ndarray::Array1;

/// Renders an array as a bracketed, comma-separated list using the shortest
/// float representation.
pub(crate) fn format_array(values: &Array1<f64>) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{v}")).collect();
    format!("[{}]", items.join(", "))
}
