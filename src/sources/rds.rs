use crate::Result;
use crate::reservation::{ReservedCommitment, days_until};
use crate::sources::ReservationSource;
use async_trait::async_trait;
use aws_sdk_rds::Client;
use aws_sdk_rds::types::ReservedDbInstance;
use chrono::{DateTime, TimeDelta, Utc};
use ohno::IntoAppError;

const LOG_TARGET: &str = "       rds";

/// Lists purchased RDS reserved DB instances.
///
/// RDS records carry no expiration timestamp; the end instant is the
/// purchase start time plus the reservation duration in seconds.
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
        "rds"
    }

    async fn list(&self) -> Result<Vec<ReservedCommitment>> {
        let now = Utc::now();
        let mut commitments = Vec::new();

        let mut pages = self.client.describe_reserved_db_instances().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.into_app_err("unable to describe RDS reserved DB instances")?;
            for record in page.reserved_db_instances() {
                if let Some(commitment) = normalize(record, now) {
                    commitments.push(commitment);
                } else {
                    log::warn!(
                        target: LOG_TARGET,
                        "skipping reserved DB instance record with missing required fields (offering: {})",
                        record.reserved_db_instances_offering_id().unwrap_or("unknown")
                    );
                }
            }
        }

        Ok(commitments)
    }
}

/// Map one raw record onto the normalized entity, or `None` when a required
/// field is absent. The DB instance class fills the instance-type slot and
/// the offering id fills the reservation-id slot.
fn normalize(record: &ReservedDbInstance, now: DateTime<Utc>) -> Option<ReservedCommitment> {
    let start_ts = record.start_time()?;
    let start = DateTime::from_timestamp(start_ts.secs(), start_ts.subsec_nanos())?;
    let end = start + TimeDelta::seconds(i64::from(record.duration()?));

    Some(ReservedCommitment {
        instance_type: record.db_instance_class()?.to_string(),
        instance_count: i64::from(record.db_instance_count()?),
        fixed_price: record.fixed_price()?,
        currency_code: record.currency_code()?.to_string(),
        reservation_id: record.reserved_db_instances_offering_id()?.to_string(),
        days_left: days_until(end, now),
    })
}
