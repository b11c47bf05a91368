use serde::Serialize;

/// Display unit of a graph's values, as the agent understands them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "percentage")]
    Percentage,
    #[serde(rename = "bytes")]
    Bytes,
    #[serde(rename = "bytes/sec")]
    BytesPerSec,
    #[serde(rename = "iops")]
    Iops,
}

/// One graph group in the agent's graph-definition document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graphs {
    pub label: String,
    pub unit: Unit,
    pub metrics: Vec<Metric>,
}

/// One metric descriptor within a graph group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub label: String,
    pub stacked: bool,

    /// Differential metrics are emitted as a per-minute rate computed
    /// against the previous run's value. Not part of the wire document.
    #[serde(skip)]
    pub diff: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_serializes_to_agent_vocabulary() {
        assert_eq!(serde_json::to_string(&Unit::Integer).unwrap(), r#""integer""#);
        assert_eq!(serde_json::to_string(&Unit::BytesPerSec).unwrap(), r#""bytes/sec""#);
    }

    #[test]
    fn diff_flag_stays_out_of_the_wire_document() {
        let metric = Metric {
            name: "connects".to_string(),
            label: "Connects".to_string(),
            stacked: false,
            diff: true,
        };

        let json = serde_json::to_string(&metric).unwrap();
        assert_eq!(json, r#"{"name":"connects","label":"Connects","stacked":false}"#);
    }
}
