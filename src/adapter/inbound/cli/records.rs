//! Record listings: members, savings, loans, penalties and loan payments.
//!
//! The backend computes every total; these handlers only fetch and print.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::RecordKind;
use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::session::authorized_client;
use crate::domain::format::{format_count, format_whole};
use crate::domain::{Loan, LoanPayment, Penalty, Saving, User};
use crate::error::{Error, Result};
use crate::infrastructure::config::Config;

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    username: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Savings")]
    savings: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone_number.clone(),
            savings: user.total_saving.map(format_whole).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct SavingRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Member")]
    member: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Date")]
    date: String,
}

impl From<&Saving> for SavingRow {
    fn from(saving: &Saving) -> Self {
        Self {
            id: saving.id.clone(),
            member: saving.username.clone(),
            phone: saving.phone_number.clone(),
            amount: format_whole(saving.amount),
            date: saving.created_at.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct LoanRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Member")]
    member: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Issued")]
    issued: String,
    #[tabled(rename = "Deadline")]
    deadline: String,
}

impl From<&Loan> for LoanRow {
    fn from(loan: &Loan) -> Self {
        Self {
            id: loan.id.clone(),
            member: loan.username.clone(),
            amount: format_whole(loan.amount),
            issued: loan.issued_date.clone().unwrap_or_default(),
            deadline: loan.deadline.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct PenaltyRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Member")]
    member: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Penalty> for PenaltyRow {
    fn from(penalty: &Penalty) -> Self {
        Self {
            id: penalty.id.clone(),
            member: penalty.member().to_string(),
            reason: penalty.reason.clone(),
            amount: format_whole(penalty.amount),
            status: penalty.status.to_string(),
        }
    }
}

#[derive(Tabled)]
struct PaymentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Date")]
    date: String,
}

impl From<&LoanPayment> for PaymentRow {
    fn from(payment: &LoanPayment) -> Self {
        Self {
            id: payment.id.clone(),
            amount: format_whole(payment.amount),
            date: payment.date().unwrap_or_default().to_string(),
        }
    }
}

fn amount_or_dash(amount: Option<Decimal>) -> String {
    amount.map_or_else(|| "-".to_string(), format_whole)
}

fn count_or_dash(count: Option<u64>) -> String {
    count.map_or_else(|| "-".to_string(), format_count)
}

/// Print `records` as a table, or as one JSON document with `totals`.
fn print_listing<'a, T, R>(
    command: &str,
    title: &str,
    records: &'a [T],
    totals: &[(&str, String)],
) where
    T: Serialize,
    R: Tabled + From<&'a T>,
{
    if output::is_json() {
        let totals: serde_json::Map<String, serde_json::Value> = totals
            .iter()
            .map(|(label, value)| ((*label).to_string(), json!(value)))
            .collect();
        output::json_output(&json!({
            "command": command,
            "records": records,
            "totals": totals,
        }));
        return;
    }

    output::section(title);
    if records.is_empty() {
        output::hint("no records");
    } else {
        let table = Table::new(records.iter().map(R::from)).to_string();
        output::lines(&table);
    }
    for (label, value) in totals {
        output::field(label, value);
    }
}

/// Point at `login` when the API rejects the token.
pub(crate) fn explain(err: Error) -> Error {
    if let Error::Api { status: 401 | 403, .. } = err {
        output::hint("run `coopdash login` to refresh the session");
    }
    err
}

/// `coopdash list <kind>`.
pub async fn execute_list(config: &Config, kind: RecordKind) -> Result<()> {
    let client = authorized_client(config)?;

    match kind {
        RecordKind::Users => {
            let users = client.list_users().await.map_err(explain)?;
            let count = u64::try_from(users.len()).unwrap_or(u64::MAX);
            print_listing::<User, UserRow>(
                "list.users",
                "Members",
                &users,
                &[("Members", format_count(count))],
            );
        }
        RecordKind::Savings => {
            let page = client.list_savings().await.map_err(explain)?;
            print_listing::<Saving, SavingRow>(
                "list.savings",
                "Savings",
                &page.savings,
                &[
                    ("Total amount", amount_or_dash(page.total_amount)),
                    ("Deposits", count_or_dash(page.total_saving)),
                ],
            );
        }
        RecordKind::Loans => {
            let page = client.list_loans().await.map_err(explain)?;
            print_listing::<Loan, LoanRow>(
                "list.loans",
                "Loans",
                &page.loans,
                &[
                    ("Total amount", amount_or_dash(page.total_amount)),
                    ("Loans", count_or_dash(page.total_loan)),
                ],
            );
        }
        RecordKind::Penalties => {
            let page = client.list_penalties().await.map_err(explain)?;
            print_listing::<Penalty, PenaltyRow>(
                "list.penalties",
                "Penalties",
                &page.penalties,
                &[
                    ("Paid", amount_or_dash(page.total_paid)),
                    ("Unpaid", amount_or_dash(page.total_unpaid)),
                ],
            );
        }
    }
    Ok(())
}

/// `coopdash payments <loan>`.
pub async fn execute_payments(config: &Config, loan_id: &str) -> Result<()> {
    let client = authorized_client(config)?;
    let page = client
        .list_loan_payments(loan_id)
        .await
        .map_err(explain)?;

    print_listing::<LoanPayment, PaymentRow>(
        "payments",
        &format!("Payments for loan {loan_id}"),
        &page.payments,
        &[
            ("Total paid", amount_or_dash(page.total_amount)),
            ("Payments", count_or_dash(page.total_payments)),
        ],
    );
    Ok(())
}
