//! One-line context-window gauge for an agent status bar.

use crate::json::access::ValueExt;
use serde_json::Value;

pub const BAR_WIDTH: usize = 12;
pub const UNKNOWN: &str = "CTX --.-%";

/// `#` cells for `percent` clamped to 0-100, padded with `-`.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round_ties_even() as usize;
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

/// `context_window.used_percentage` as a gauge line; any other input
/// yields the unknown marker.
pub fn render(input: &str) -> String {
    let Ok(payload) = serde_json::from_str::<Value>(input) else {
        return UNKNOWN.to_string();
    };
    match payload
        .at(&["context_window", "used_percentage"])
        .and_then(Value::as_f64)
    {
        Some(pct) if pct.is_finite() => {
            format!("CTX {pct:5.1}% {}", progress_bar(pct, BAR_WIDTH))
        }
        _ => UNKNOWN.to_string(),
    }
}
