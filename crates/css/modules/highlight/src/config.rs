//! Resolver settings.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Paint collapsed ranges that touch a run. Off by default: a caret-sized
    /// range covers no text.
    #[serde(alias = "renderCollapsedRanges")]
    pub render_collapsed_ranges: bool,
}

impl ResolverConfig {
    /// Read settings from JSON; missing fields keep their defaults.
    ///
    /// # Errors
    /// Returns the `serde_json` error for malformed input or mistyped fields.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
