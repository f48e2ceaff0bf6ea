//! Pass configuration.

use serde::Deserialize;

/// Options controlling which feature tiers are converted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LegalizeOptions {
    /// Encode experimental-tier ops as custom calls instead of rejecting them.
    pub allow_experimental_features: bool,
}

impl LegalizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_experimental_features(mut self, allow: bool) -> Self {
        self.allow_experimental_features = allow;
        self
    }
}
