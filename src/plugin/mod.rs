//! Mackerel agent plugin protocol.
//!
//! The agent invokes a metrics plugin in two modes: once at startup with
//! `MACKEREL_AGENT_PLUGIN_META` set, expecting the graph-definition JSON
//! document, and then periodically expecting one tab-separated
//! `name\tvalue\tepoch` line per metric. [`Runner`] drives a [`Plugin`]
//! through either mode and keeps the between-runs state file that
//! differential metrics are computed from.

pub mod expiration;

mod graphs;
mod runner;

pub use graphs::{Graphs, Metric, Unit};
pub use runner::Runner;

use crate::Result;
use std::collections::BTreeMap;

/// The contract the agent integration requires from a metrics plugin:
/// a current-values snapshot, the structural definition of the graphs those
/// values belong to, and the namespace prefix both are published under.
pub trait Plugin {
    /// Metric key prefix, forming the `custom.<prefix>` namespace.
    fn metric_key_prefix(&self) -> String;

    /// Snapshot of current values, keyed by metric name.
    ///
    /// # Errors
    ///
    /// Returns an error if the values cannot be produced.
    fn fetch_metrics(&self) -> Result<BTreeMap<String, f64>>;

    /// Graph groups keyed by graph name suffix; an empty key publishes the
    /// group directly under the prefix.
    ///
    /// Metric names here must match the snapshot's keys exactly, so both
    /// sides derive them from the same place.
    fn graph_definition(&self) -> BTreeMap<String, Graphs>;
}
