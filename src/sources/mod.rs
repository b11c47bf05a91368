//! Reservation sources.
//!
//! Each source wraps one AWS API that sells reserved capacity and lists the
//! account's purchased commitments as normalized [`ReservedCommitment`]s.
//! Sources are independent: the collector keeps whatever each one returns
//! and a failure in one never blocks the others.

pub mod ec2;
pub mod rds;

use crate::Result;
use crate::reservation::ReservedCommitment;
use async_trait::async_trait;

const LOG_TARGET: &str = " collector";

/// A provider-specific lister of purchased reserved-capacity commitments.
#[async_trait]
pub trait ReservationSource: Send + Sync {
    /// Source name used for logging (e.g., `"ec2"`, `"rds"`).
    fn name(&self) -> &'static str;

    /// List the account's commitments, normalized.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying API call fails; a failed call
    /// contributes no commitments, never a partial list.
    async fn list(&self) -> Result<Vec<ReservedCommitment>>;
}

/// Fetch every registered source in order and concatenate the results.
///
/// Registration order is the output order, so a fixed source list yields
/// reproducible metric ordering. A source that fails is logged and skipped;
/// both sources failing yields an empty list rather than an error, which the
/// reporter turns into an empty (but still well-formed) metric set.
pub async fn collect_commitments(sources: &[Box<dyn ReservationSource>]) -> Vec<ReservedCommitment> {
    let mut commitments = Vec::new();

    for source in sources {
        match source.list().await {
            Ok(mut found) => {
                log::info!(target: LOG_TARGET, "{} reserved instances from {}", found.len(), source.name());
                commitments.append(&mut found);
            }
            Err(e) => {
                log::error!(target: LOG_TARGET, "listing {} reservations failed: {e}", source.name());
            }
        }
    }

    commitments
}
