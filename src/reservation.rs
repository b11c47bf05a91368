use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};

/// A purchased reserved-capacity commitment, normalized across the AWS
/// services that sell them.
///
/// One instance is produced per reservation record returned by a source,
/// lives for a single fetch-format-emit cycle, and is discarded on exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservedCommitment {
    /// Provider-specific class/size identifier (`t3.small`, `db.r5.large`).
    pub instance_type: String,

    /// Number of resource units covered by this commitment.
    pub instance_count: i64,

    /// Up-front price paid, in `currency_code` units.
    pub fixed_price: f64,

    /// ISO-like currency code (`USD`).
    pub currency_code: String,

    /// Provider-assigned unique identifier for the commitment.
    pub reservation_id: String,

    /// Whole days until the commitment expires, truncated toward zero.
    /// Negative once the commitment has already expired.
    pub days_left: i64,
}

impl ReservedCommitment {
    /// Derive the stable metric name for this commitment.
    ///
    /// The key doubles as the display label and must survive as a Mackerel
    /// metric name, so underscores are the only separators introduced:
    /// dots in the instance type are replaced, the fixed price is truncated
    /// to an integer and fused with the currency code, and the count gets a
    /// literal `instances` suffix. Example:
    /// `t3_small_494USD_3instances_ri-0abc123`.
    ///
    /// Reservation ids are unique per account and region; the full key is
    /// human-readable rather than guaranteed globally unique.
    #[must_use]
    pub fn metric_key(&self) -> String {
        format!(
            "{}_{}{}_{}instances_{}",
            self.instance_type.replace('.', "_"),
            self.fixed_price.trunc() as i64,
            self.currency_code,
            self.instance_count,
            self.reservation_id
        )
    }
}

impl Display for ReservedCommitment {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({} days left)", self.metric_key(), self.days_left)
    }
}

/// Whole days between `now` and `end`, truncated toward zero.
///
/// A commitment with 23h59m remaining reports 0 days, not 1, and one that
/// expired 90 minutes ago reports 0 as well; the sign only shows up once a
/// full day has passed in either direction.
#[must_use]
pub fn days_until(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (end - now).num_hours() / 24
}
