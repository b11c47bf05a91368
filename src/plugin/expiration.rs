//! The reservation-expiration plugin: bridges a fetched commitment list to
//! the snapshot/definition pair the agent integration consumes.

use super::{Graphs, Metric, Plugin, Unit};
use crate::Result;
use crate::reservation::ReservedCommitment;
use std::collections::BTreeMap;

/// Metric key prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "aws-ri-expiration";

/// Reports days-until-expiration for a set of reserved-capacity
/// commitments, one metric per commitment, all in a single unnamed graph
/// group.
#[derive(Debug)]
pub struct RiExpirationPlugin {
    prefix: String,
    commitments: Vec<ReservedCommitment>,
}

impl RiExpirationPlugin {
    #[must_use]
    pub fn new(prefix: impl Into<String>, commitments: Vec<ReservedCommitment>) -> Self {
        Self {
            prefix: prefix.into(),
            commitments,
        }
    }
}

impl Plugin for RiExpirationPlugin {
    fn metric_key_prefix(&self) -> String {
        if self.prefix.is_empty() {
            DEFAULT_PREFIX.to_string()
        } else {
            self.prefix.clone()
        }
    }

    /// Metric key → days left, signed. An already-expired commitment
    /// reports its true negative day count; nothing is widened into an
    /// unsigned range where it would wrap.
    fn fetch_metrics(&self) -> Result<BTreeMap<String, f64>> {
        Ok(self
            .commitments
            .iter()
            .map(|commitment| (commitment.metric_key(), commitment.days_left as f64))
            .collect())
    }

    fn graph_definition(&self) -> BTreeMap<String, Graphs> {
        let label_prefix = title_case(&self.metric_key_prefix());
        let metrics = self
            .commitments
            .iter()
            .map(|commitment| {
                let key = commitment.metric_key();
                Metric {
                    name: key.clone(),
                    label: key,
                    stacked: false,
                    diff: false,
                }
            })
            .collect();

        BTreeMap::from([(
            String::new(),
            Graphs {
                label: format!("{label_prefix}Days Left"),
                unit: Unit::Integer,
                metrics,
            },
        )])
    }
}

/// Capitalize the first letter of each word, word boundaries being any
/// non-alphanumeric character: `aws-ri-expiration` → `Aws-Ri-Expiration`.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    out
}
