//! Aggregate statistics pushed by the live feed.
//!
//! The server sends partial snapshots; the client folds each one into the
//! value it already holds. A field that a snapshot omits (or sends as
//! `null`) keeps its previous value.
//!
//! Numbers are read the way the dashboard displays them: a count sent as
//! `12.0` is still 12, and an amount too large for [`Decimal`] is treated
//! as absent rather than failing the rest of the snapshot.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Currently known aggregate statistics. `None` means "not yet known".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub total_savings: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub total_loans: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub total_penalties: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub user_count: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub sum_latest_saving: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub sum_latest_loan_payments: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl AggregateStats {
    /// Parse one snapshot payload.
    ///
    /// The payload must be a JSON object. Unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for invalid JSON, non-object payloads, and
    /// fields of the wrong type.
    pub fn parse_snapshot(payload: &str) -> Result<Self, serde_json::Error> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(payload)?;
        serde_json::from_value(serde_json::Value::Object(object))
    }

    /// Shallow merge: every field present in `snapshot` overwrites ours.
    pub fn merge(&mut self, snapshot: Self) {
        fn take<T>(slot: &mut Option<T>, incoming: Option<T>) {
            if incoming.is_some() {
                *slot = incoming;
            }
        }

        take(&mut self.total_savings, snapshot.total_savings);
        take(&mut self.total_loans, snapshot.total_loans);
        take(&mut self.total_penalties, snapshot.total_penalties);
        take(&mut self.user_count, snapshot.user_count);
        take(&mut self.sum_latest_saving, snapshot.sum_latest_saving);
        take(
            &mut self.sum_latest_loan_payments,
            snapshot.sum_latest_loan_payments,
        );
        take(&mut self.generated_at, snapshot.generated_at);
    }

    /// Number of fields currently known.
    #[must_use]
    pub fn known_fields(&self) -> usize {
        [
            self.total_savings.is_some(),
            self.total_loans.is_some(),
            self.total_penalties.is_some(),
            self.user_count.is_some(),
            self.sum_latest_saving.is_some(),
            self.sum_latest_loan_payments.is_some(),
            self.generated_at.is_some(),
        ]
        .into_iter()
        .filter(|known| *known)
        .count()
    }
}

/// Numbers and numeric strings. A JSON number outside the range of
/// [`Decimal`] reads as absent; a non-numeric string is an error.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(value) => value,
    };
    match serde_json::from_value::<Decimal>(value.clone()) {
        Ok(amount) => Ok(Some(amount)),
        Err(_) if value.is_number() => Ok(None),
        Err(e) => Err(serde::de::Error::custom(e)),
    }
}

/// Non-negative integers, including integral floats such as `12.0`.
fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(count) = number.as_u64() {
        return Ok(Some(count));
    }
    match number.as_f64() {
        Some(value) if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Ok(Some(value as u64))
        }
        _ => Err(serde::de::Error::custom(format!("invalid count: {number}"))),
    }
}

/// Accepts RFC 3339 timestamps and naive ISO 8601 ones (read as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_timestamp(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
