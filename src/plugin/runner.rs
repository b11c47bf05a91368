use super::{Graphs, Plugin};
use crate::Result;
use chrono::Utc;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

const LOG_TARGET: &str = "    plugin";

/// Set by the agent when it wants the graph schema instead of values.
const PLUGIN_META_ENV: &str = "MACKEREL_AGENT_PLUGIN_META";

/// Overrides the directory default state files are placed in.
const WORKDIR_ENV: &str = "MACKEREL_PLUGIN_WORKDIR";

/// Snapshot persisted between runs so differential metrics can be computed
/// as a rate against the previous invocation.
#[derive(Debug, Serialize, Deserialize)]
struct SavedState {
    last_time: i64,
    values: BTreeMap<String, f64>,
}

/// Top-level graph-definition document.
#[derive(Debug, Serialize)]
struct GraphDef {
    graphs: BTreeMap<String, Graphs>,
}

/// Drives a [`Plugin`] through one agent invocation.
#[derive(Debug)]
pub struct Runner {
    tempfile: Option<PathBuf>,
}

impl Runner {
    /// `tempfile` overrides the state file location; `None` uses the agent's
    /// workdir convention.
    #[must_use]
    pub fn new(tempfile: Option<PathBuf>) -> Self {
        Self { tempfile }
    }

    /// Run one agent cycle against `out` (normally locked stdout): the
    /// graph definitions when the agent asks for metadata, the current
    /// values otherwise.
    pub fn run<P: Plugin, W: Write>(&self, plugin: &P, out: &mut W) -> Result<()> {
        if env::var(PLUGIN_META_ENV).is_ok_and(|v| !v.is_empty()) {
            self.output_definitions(plugin, out)
        } else {
            self.output_values(plugin, out)
        }
    }

    /// Print the plugin meta header followed by the graph schema JSON.
    pub fn output_definitions<P: Plugin, W: Write>(&self, plugin: &P, out: &mut W) -> Result<()> {
        let prefix = plugin.metric_key_prefix();
        let graphs = plugin
            .graph_definition()
            .into_iter()
            .map(|(key, graphs)| (graph_name(&prefix, &key), graphs))
            .collect();

        writeln!(out, "# mackerel-agent-plugin")?;
        serde_json::to_writer(&mut *out, &GraphDef { graphs }).into_app_err("unable to serialize graph definitions")?;
        writeln!(out)?;
        Ok(())
    }

    /// Print one `name\tvalue\tepoch` line per metric with a current value,
    /// then persist the snapshot for the next run.
    ///
    /// Differential metrics with no usable previous value are silently
    /// omitted for this run; they start reporting on the next one.
    pub fn output_values<P: Plugin, W: Write>(&self, plugin: &P, out: &mut W) -> Result<()> {
        let prefix = plugin.metric_key_prefix();
        let now = Utc::now().timestamp();
        let values = plugin.fetch_metrics()?;
        let previous = self.load_state(&prefix);

        for (graph_key, graph) in plugin.graph_definition() {
            let group = graph_name(&prefix, &graph_key);
            for metric in &graph.metrics {
                let Some(&value) = values.get(&metric.name) else {
                    continue;
                };

                let value = if metric.diff {
                    let last = previous
                        .as_ref()
                        .and_then(|state| state.values.get(&metric.name).map(|&v| (state.last_time, v)));
                    match diff_rate(value, last, now) {
                        Some(rate) => rate,
                        None => continue,
                    }
                } else {
                    value
                };

                writeln!(out, "{group}.{}\t{value}\t{now}", metric.name)?;
            }
        }

        self.save_state(&prefix, now, values);
        Ok(())
    }

    /// Load the previous run's snapshot. State is an optimization, never a
    /// hard requirement: an unreadable or corrupt file logs a warning and
    /// the run proceeds without it.
    fn load_state(&self, prefix: &str) -> Option<SavedState> {
        let path = self.state_path(prefix);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "unable to read state file {}: {e}", path.display());
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(state) => Some(state),
            Err(e) => {
                log::warn!(target: LOG_TARGET, "discarding unparsable state file {}: {e}", path.display());
                None
            }
        }
    }

    fn save_state(&self, prefix: &str, now: i64, values: BTreeMap<String, f64>) {
        let path = self.state_path(prefix);
        let state = SavedState { last_time: now, values };

        let result = serde_json::to_vec(&state)
            .map_err(std::io::Error::other)
            .and_then(|bytes| fs::write(&path, bytes));
        if let Err(e) = result {
            log::warn!(target: LOG_TARGET, "unable to write state file {}: {e}", path.display());
        }
    }

    fn state_path(&self, prefix: &str) -> PathBuf {
        self.tempfile.clone().unwrap_or_else(|| default_state_path(prefix))
    }
}

/// Fully-qualified graph name: `custom.<prefix>` for the unnamed group,
/// `custom.<prefix>.<key>` otherwise.
fn graph_name(prefix: &str, graph_key: &str) -> String {
    if graph_key.is_empty() {
        format!("custom.{prefix}")
    } else {
        format!("custom.{prefix}.{graph_key}")
    }
}

/// `$MACKEREL_PLUGIN_WORKDIR` (or the OS temp dir) joined with the
/// conventional `mackerel-plugin-<prefix>` file name.
fn default_state_path(prefix: &str) -> PathBuf {
    let dir = env::var_os(WORKDIR_ENV).map_or_else(env::temp_dir, PathBuf::from);
    dir.join(format!("mackerel-plugin-{prefix}"))
}

/// Per-minute rate between the previous and current observation, or `None`
/// when there is no previous value, no time has passed, or the counter went
/// backwards (reset).
fn diff_rate(current: f64, previous: Option<(i64, f64)>, now: i64) -> Option<f64> {
    let (last_time, last_value) = previous?;
    let elapsed = now - last_time;
    if elapsed <= 0 {
        return None;
    }

    let rate = (current - last_value) * 60.0 / elapsed as f64;
    (rate >= 0.0).then_some(rate)
}
