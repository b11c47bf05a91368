//! Mackerel agent plugin reporting days until AWS reserved instances expire.
//!
//! # Overview
//!
//! `mackerel-plugin-aws-ri-expiration` lists the purchased reserved-capacity
//! commitments in an AWS account (EC2 reserved instances and RDS reserved DB
//! instances) and publishes one metric per commitment: the number of whole
//! days until it expires. Graphing the countdown makes upcoming renewals
//! visible well before the capacity lapses; a commitment that has already
//! expired reports a negative value.
//!
//! # Usage
//!
//! ```bash
//! mackerel-plugin-aws-ri-expiration [--region REGION] [--metric-key-prefix PREFIX] [--tempfile PATH]
//! ```
//!
//! Credentials come from the SDK's default provider chain (environment,
//! shared profile, instance metadata). With no `--region` the SDK's region
//! resolution applies.
//!
//! Example agent configuration:
//!
//! ```toml
//! [plugin.metrics.aws-ri-expiration]
//! command = "mackerel-plugin-aws-ri-expiration --region us-east-1"
//! ```
//!
//! A failure to list one service's reservations is logged and leaves the
//! other service's metrics intact; set `RUST_LOG=debug` for diagnostics.

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use mackerel_plugin_aws_ri_expiration::Result;
use mackerel_plugin_aws_ri_expiration::plugin::Runner;
use mackerel_plugin_aws_ri_expiration::plugin::expiration::{DEFAULT_PREFIX, RiExpirationPlugin};
use mackerel_plugin_aws_ri_expiration::sources::{ReservationSource, collect_commitments, ec2, rds};
use std::io;
use std::path::PathBuf;

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "mackerel-plugin-aws-ri-expiration", version, about)]
#[command(styles = CLAP_STYLES)]
struct Args {
    /// AWS region [default: the SDK's region resolution chain]
    #[arg(long, value_name = "REGION", default_value = "")]
    region: String,

    /// Metric key prefix
    #[arg(long, value_name = "PREFIX", default_value = DEFAULT_PREFIX)]
    metric_key_prefix: String,

    /// State file name [default: the agent's workdir convention]
    #[arg(long, value_name = "PATH", default_value = "")]
    tempfile: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if !args.region.is_empty() {
        loader = loader.region(aws_config::Region::new(args.region.clone()));
    }
    let config = loader.load().await;

    let sources: Vec<Box<dyn ReservationSource>> = vec![
        Box::new(ec2::Provider::new(aws_sdk_ec2::Client::new(&config))),
        Box::new(rds::Provider::new(aws_sdk_rds::Client::new(&config))),
    ];

    let commitments = collect_commitments(&sources).await;
    let plugin = RiExpirationPlugin::new(args.metric_key_prefix, commitments);

    let tempfile = (!args.tempfile.is_empty()).then(|| PathBuf::from(&args.tempfile));
    let runner = Runner::new(tempfile);

    let stdout = io::stdout();
    runner.run(&plugin, &mut stdout.lock())
}

fn init_logging() {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(true)
        .init();
}
