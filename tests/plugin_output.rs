//! End-to-end checks of the fetch → normalize → emit cycle, with the AWS
//! APIs stood in for by fixed reservation sources.

use async_trait::async_trait;
use mackerel_plugin_aws_ri_expiration::Result;
use mackerel_plugin_aws_ri_expiration::plugin::Runner;
use mackerel_plugin_aws_ri_expiration::plugin::expiration::RiExpirationPlugin;
use mackerel_plugin_aws_ri_expiration::reservation::ReservedCommitment;
use mackerel_plugin_aws_ri_expiration::sources::{ReservationSource, collect_commitments};
use std::path::PathBuf;

struct StaticSource {
    name: &'static str,
    commitments: Vec<ReservedCommitment>,
}

#[async_trait]
impl ReservationSource for StaticSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn list(&self) -> Result<Vec<ReservedCommitment>> {
        Ok(self.commitments.clone())
    }
}

struct DownSource;

#[async_trait]
impl ReservationSource for DownSource {
    fn name(&self) -> &'static str {
        "down"
    }

    async fn list(&self) -> Result<Vec<ReservedCommitment>> {
        Err(ohno::app_err!("connection refused"))
    }
}

fn commitment(instance_type: &str, count: i64, price: f64, id: &str, days_left: i64) -> ReservedCommitment {
    ReservedCommitment {
        instance_type: instance_type.to_string(),
        instance_count: count,
        fixed_price: price,
        currency_code: "USD".to_string(),
        reservation_id: id.to_string(),
        days_left,
    }
}

fn state_file() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mackerel-plugin-aws-ri-expiration");
    (dir, path)
}

#[tokio::test]
async fn full_cycle_emits_one_line_per_commitment() {
    let sources: Vec<Box<dyn ReservationSource>> = vec![
        Box::new(StaticSource {
            name: "ec2",
            commitments: vec![
                commitment("t3.small", 3, 494.2, "ri-0abc123", 355),
                commitment("m5.xlarge", 1, 1660.0, "ri-0def456", 12),
            ],
        }),
        Box::new(StaticSource {
            name: "rds",
            commitments: vec![commitment("db.r5.large", 2, 8875.0, "offering-649fd0c8", 180)],
        }),
    ];

    let plugin = RiExpirationPlugin::new("aws-ri-expiration", collect_commitments(&sources).await);
    let (_dir, path) = state_file();
    let runner = Runner::new(Some(path));

    let mut out = Vec::new();
    runner.output_values(&plugin, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<Vec<&str>> = text.lines().map(|line| line.split('\t').collect()).collect();
    assert_eq!(lines.len(), 3);

    assert_eq!(lines[0][0], "custom.aws-ri-expiration.t3_small_494USD_3instances_ri-0abc123");
    assert_eq!(lines[0][1], "355");
    assert_eq!(lines[1][0], "custom.aws-ri-expiration.m5_xlarge_1660USD_1instances_ri-0def456");
    assert_eq!(lines[1][1], "12");
    assert_eq!(lines[2][0], "custom.aws-ri-expiration.db_r5_large_8875USD_2instances_offering-649fd0c8");
    assert_eq!(lines[2][1], "180");

    for fields in &lines {
        assert_eq!(fields.len(), 3);
        let _epoch: i64 = fields[2].parse().unwrap();
    }
}

#[tokio::test]
async fn one_failed_source_still_reports_the_other() {
    let sources: Vec<Box<dyn ReservationSource>> = vec![
        Box::new(DownSource),
        Box::new(StaticSource {
            name: "rds",
            commitments: vec![
                commitment("db.t3.medium", 1, 602.0, "offering-1", 90),
                commitment("db.r5.large", 2, 8875.0, "offering-2", 180),
            ],
        }),
    ];

    let plugin = RiExpirationPlugin::new("aws-ri-expiration", collect_commitments(&sources).await);
    let (_dir, path) = state_file();
    let runner = Runner::new(Some(path));

    let mut out = Vec::new();
    runner.output_values(&plugin, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let names: Vec<&str> = text.lines().filter_map(|line| line.split('\t').next()).collect();
    assert_eq!(
        names,
        [
            "custom.aws-ri-expiration.db_t3_medium_602USD_1instances_offering-1",
            "custom.aws-ri-expiration.db_r5_large_8875USD_2instances_offering-2",
        ]
    );
}

#[tokio::test]
async fn every_source_failing_still_produces_well_formed_output() {
    let sources: Vec<Box<dyn ReservationSource>> = vec![Box::new(DownSource), Box::new(DownSource)];

    let plugin = RiExpirationPlugin::new("aws-ri-expiration", collect_commitments(&sources).await);
    let (_dir, path) = state_file();
    let runner = Runner::new(Some(path));

    let mut values = Vec::new();
    runner.output_values(&plugin, &mut values).unwrap();
    assert!(values.is_empty());

    let mut definitions = Vec::new();
    runner.output_definitions(&plugin, &mut definitions).unwrap();
    let text = String::from_utf8(definitions).unwrap();
    let (header, body) = text.split_once('\n').unwrap();
    assert_eq!(header, "# mackerel-agent-plugin");

    let doc: serde_json::Value = serde_json::from_str(body).unwrap();
    let graph = &doc["graphs"]["custom.aws-ri-expiration"];
    assert_eq!(graph["metrics"].as_array().unwrap().len(), 0);
}

#[test]
fn definitions_match_value_names() {
    let plugin = RiExpirationPlugin::new(
        "aws-ri-expiration",
        vec![
            commitment("t3.small", 3, 494.2, "ri-0abc123", 355),
            commitment("db.r5.large", 2, 8875.0, "offering-649fd0c8", 180),
        ],
    );
    let (_dir, path) = state_file();
    let runner = Runner::new(Some(path));

    let mut values = Vec::new();
    runner.output_values(&plugin, &mut values).unwrap();
    let values = String::from_utf8(values).unwrap();
    let mut value_names: Vec<String> = values
        .lines()
        .filter_map(|line| line.split('\t').next().map(str::to_string))
        .collect();
    value_names.sort();

    let mut definitions = Vec::new();
    runner.output_definitions(&plugin, &mut definitions).unwrap();
    let text = String::from_utf8(definitions).unwrap();
    let (_, body) = text.split_once('\n').unwrap();
    let doc: serde_json::Value = serde_json::from_str(body).unwrap();

    let graph_name = "custom.aws-ri-expiration";
    let mut defined_names: Vec<String> = doc["graphs"][graph_name]["metrics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| format!("{graph_name}.{}", m["name"].as_str().unwrap()))
        .collect();
    defined_names.sort();

    assert_eq!(value_names, defined_names);
}

#[test]
fn expired_commitments_emit_negative_values() {
    let plugin = RiExpirationPlugin::new("aws-ri-expiration", vec![commitment("t3.small", 3, 494.0, "ri-1", -7)]);
    let (_dir, path) = state_file();
    let runner = Runner::new(Some(path));

    let mut out = Vec::new();
    runner.output_values(&plugin, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let fields: Vec<&str> = text.lines().next().unwrap().split('\t').collect();
    assert_eq!(fields[1], "-7");
}
