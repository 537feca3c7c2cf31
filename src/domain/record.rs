//! Cooperative records served by the REST API.
//!
//! The backend evolves independently of this client, so every field is
//! tolerant: missing values default instead of failing the whole response.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A cooperative member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub total_saving: Option<Decimal>,
}

/// Editable member fields. The password is never sent on update.
#[derive(Debug, Clone, Serialize)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    pub phone_number: String,
}

/// Signup request for a new member.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub confirm_password: String,
}

/// A single savings deposit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Saving {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(deserialize_with = "flexible_id")]
    pub user_id: String,
    pub username: String,
    pub phone_number: String,
    pub amount: Decimal,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SavingsPage {
    pub total_amount: Option<Decimal>,
    pub total_saving: Option<u64>,
    pub savings: Vec<Saving>,
}

/// A loan issued to a member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Loan {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(deserialize_with = "flexible_id")]
    pub user_id: String,
    pub username: String,
    pub phone_number: String,
    pub amount: Decimal,
    pub issued_date: Option<String>,
    pub deadline: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoansPage {
    pub total_amount: Option<Decimal>,
    pub total_loan: Option<u64>,
    pub loans: Vec<Loan>,
}

/// A repayment against a loan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanPayment {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub amount: Decimal,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl LoanPayment {
    /// The best available timestamp for display.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.created_at
            .as_deref()
            .or(self.updated_at.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentsPage {
    pub total_amount: Option<Decimal>,
    pub total_payments: Option<u64>,
    pub payments: Vec<LoanPayment>,
}

/// Payment state of a penalty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenaltyStatus {
    #[serde(alias = "Paid")]
    Paid,
    #[default]
    #[serde(alias = "Unpaid")]
    Unpaid,
}

impl std::fmt::Display for PenaltyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paid => f.write_str("paid"),
            Self::Unpaid => f.write_str("unpaid"),
        }
    }
}

/// A penalty charged to a member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Penalty {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(deserialize_with = "flexible_id")]
    pub user_id: String,
    pub username: Option<String>,
    pub reason: String,
    pub amount: Decimal,
    pub status: PenaltyStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Penalty {
    /// Display name for the penalised member, falling back to the id.
    #[must_use]
    pub fn member(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.user_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PenaltiesPage {
    pub total_paid: Option<Decimal>,
    pub total_unpaid: Option<Decimal>,
    pub penalties: Vec<Penalty>,
}

/// Ids arrive as strings from some endpoints and as numbers from others.
fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(id)) => Ok(id),
        Some(serde_json::Value::Number(id)) => Ok(id.to_string()),
        Some(other) => Err(serde::de::Error::custom(format!("invalid id: {other}"))),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn user_ignores_unknown_fields() {
        let user: User = serde_json::from_str(
            r#"{"id": "u1", "username": "Amina", "phone_number": "0712", "role": "member"}"#,
        )
        .unwrap();
        assert_eq!(user.username, "Amina");
        assert_eq!(user.phone_number, "0712");
        assert_eq!(user.total_saving, None);
    }

    #[test]
    fn savings_page_tolerates_missing_fields() {
        let page: SavingsPage = serde_json::from_str(
            r#"{"total_amount": 1500, "savings": [{"id": "s1", "amount": 500}]}"#,
        )
        .unwrap();
        assert_eq!(page.total_amount, Some(dec!(1500)));
        assert_eq!(page.total_saving, None);
        assert_eq!(page.savings[0].amount, dec!(500));
        assert!(page.savings[0].username.is_empty());
    }

    #[test]
    fn penalty_member_falls_back_to_user_id() {
        let penalty: Penalty = serde_json::from_str(
            r#"{"id": "p1", "user_id": "u9", "reason": "late", "amount": 50, "status": "paid"}"#,
        )
        .unwrap();
        assert_eq!(penalty.member(), "u9");
        assert_eq!(penalty.status, PenaltyStatus::Paid);
    }

    #[test]
    fn numeric_ids_become_strings() {
        let loan: Loan =
            serde_json::from_str(r#"{"id": 42, "user_id": 7, "amount": "1200.50"}"#).unwrap();
        assert_eq!(loan.id, "42");
        assert_eq!(loan.user_id, "7");
        assert_eq!(loan.amount, dec!(1200.50));
    }

    #[test]
    fn payment_date_prefers_created_at() {
        let payment = LoanPayment {
            created_at: None,
            updated_at: Some("2024-11-02".into()),
            ..LoanPayment::default()
        };
        assert_eq!(payment.date(), Some("2024-11-02"));
    }
}
