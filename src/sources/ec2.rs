use crate::Result;
use crate::reservation::{ReservedCommitment, days_until};
use crate::sources::ReservationSource;
use async_trait::async_trait;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::ReservedInstances;
use chrono::{DateTime, Utc};
use ohno::IntoAppError;

const LOG_TARGET: &str = "       ec2";

/// Lists purchased EC2 reserved instances.
///
/// EC2 records carry an explicit expiration timestamp, so the remaining-days
/// computation works directly off the record's `end` attribute.
#[derive(Debug, Clone)]
pub struct Provider {
    client: Client,
}

impl Provider {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReservationSource for Provider {
    fn name(&self) -> &'static str {
        "ec2"
    }

    async fn list(&self) -> Result<Vec<ReservedCommitment>> {
        let output = self
            .client
            .describe_reserved_instances()
            .send()
            .await
            .into_app_err("unable to describe EC2 reserved instances")?;

        let now = Utc::now();
        let mut commitments = Vec::new();
        for record in output.reserved_instances() {
            if let Some(commitment) = normalize(record, now) {
                commitments.push(commitment);
            } else {
                log::warn!(
                    target: LOG_TARGET,
                    "skipping reserved instance record with missing required fields (id: {})",
                    record.reserved_instances_id().unwrap_or("unknown")
                );
            }
        }

        Ok(commitments)
    }
}

/// Map one raw record onto the normalized entity, or `None` when a required
/// field is absent. `now` is sampled once per fetch, not per record.
fn normalize(record: &ReservedInstances, now: DateTime<Utc>) -> Option<ReservedCommitment> {
    let end_ts = record.end()?;
    let end = DateTime::from_timestamp(end_ts.secs(), end_ts.subsec_nanos())?;

    Some(ReservedCommitment {
        instance_type: record.instance_type()?.as_str().to_string(),
        instance_count: i64::from(record.instance_count()?),
        fixed_price: f64::from(record.fixed_price()?),
        currency_code: record.currency_code()?.as_str().to_string(),
        reservation_id: record.reserved_instances_id()?.to_string(),
        days_left: days_until(end, now),
    })
}
