//! Configuration count cap.
//!
//! Truncation keeps the ascending prefix of a sorted, unique sequence, so the
//! numerically largest identifiers are the ones discarded. Identifier order
//! carries no energy or probability meaning; the rule is a fixed policy.

use serde::{Deserialize, Serialize};

/// Outcome of applying a [`TruncationPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truncated {
    /// Surviving identifiers, ascending.
    pub configs: Vec<u64>,
    /// Number of identifiers dropped.
    pub discarded: usize,
}

/// Caps a configuration list at `max_configs` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationPolicy {
    max_configs: usize,
    reserved: Option<u64>,
}

impl TruncationPolicy {
    /// Plain ascending-prefix truncation.
    pub fn new(max_configs: usize) -> Self {
        Self {
            max_configs,
            reserved: None,
        }
    }

    /// Keep `reference` even if it falls outside the prefix.
    ///
    /// When the reference is present in the input but beyond the cap, it
    /// takes the slot of the largest kept identifier. The output stays
    /// ascending and its length is unchanged.
    pub fn reserving(mut self, reference: u64) -> Self {
        self.reserved = Some(reference);
        self
    }

    /// Apply the cap to an ascending, duplicate-free sequence.
    pub fn apply(&self, mut configs: Vec<u64>) -> Truncated {
        debug_assert!(configs.windows(2).all(|w| w[0] < w[1]));

        if configs.len() <= self.max_configs {
            return Truncated {
                configs,
                discarded: 0,
            };
        }

        let discarded = configs.len() - self.max_configs;
        let keep_reference = self.reserved.filter(|r| {
            self.max_configs > 0 && configs[self.max_configs..].binary_search(r).is_ok()
        });
        configs.truncate(self.max_configs);

        if let Some(reference) = keep_reference {
            // Reference is larger than every kept entry, so it goes last.
            if let Some(last) = configs.last_mut() {
                *last = reference;
            }
        }

        Truncated { configs, discarded }
    }
}
