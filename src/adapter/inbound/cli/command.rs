//! Command-line interface definitions.
//!
//! Defines the CLI structure for the coopdash application using `clap`:
//! the live overview, REST record listings and edits, login session
//! management and diagnostic checks.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Savings cooperative administration dashboard
#[derive(Parser, Debug)]
#[command(name = "coopdash")]
#[command(version)]
pub struct Cli {
    /// Configuration file [default: config.toml, built-in defaults if absent]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the coopdash CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream live statistics until interrupted
    Watch,

    /// Print the statistics overview once
    Overview(OverviewArgs),

    /// Log in and store the session token
    Login(LoginArgs),

    /// Remove the stored session token
    Logout,

    /// List cooperative records
    List(ListArgs),

    /// List the payments made against a loan
    Payments(PaymentsArgs),

    /// Register a new member
    Signup(SignupArgs),

    /// Record a saving, loan, loan payment or penalty
    #[command(subcommand)]
    Add(AddCommand),

    /// Edit a member or a saving
    #[command(subcommand)]
    Update(UpdateCommand),

    /// Delete a member, saving or loan
    Delete(DeleteArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Arguments for `coopdash overview`.
#[derive(Parser, Debug)]
pub struct OverviewArgs {
    /// Seconds to wait for the first snapshot
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
}

/// Arguments for `coopdash login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Administrator email
    #[arg(long)]
    pub email: Option<String>,

    /// Password (prompted when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

/// Record collections served by the REST API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    Users,
    Savings,
    Loans,
    Penalties,
}

/// Arguments for `coopdash list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Which records to list
    #[arg(value_enum)]
    pub kind: RecordKind,
}

/// Arguments for `coopdash payments`.
#[derive(Parser, Debug)]
pub struct PaymentsArgs {
    /// Loan identifier
    pub loan_id: String,
}

/// Arguments for `coopdash signup`.
#[derive(Parser, Debug)]
pub struct SignupArgs {
    /// Member name
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: String,

    /// Password (prompted twice when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

/// Subcommands for `coopdash add`.
#[derive(Subcommand, Debug)]
pub enum AddCommand {
    /// Record a savings deposit
    Saving {
        /// Member identifier
        user_id: String,
        amount: Decimal,
    },
    /// Issue a loan
    Loan {
        /// Member identifier
        user_id: String,
        amount: Decimal,
        /// Repayment deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: NaiveDate,
        /// Issue date (YYYY-MM-DD) [default: now]
        #[arg(long)]
        issued: Option<NaiveDate>,
    },
    /// Record a repayment against a loan
    Payment {
        /// Member identifier
        user_id: String,
        /// Loan identifier
        loan_id: String,
        amount: Decimal,
    },
    /// Charge a penalty (starts unpaid)
    Penalty {
        /// Member identifier
        user_id: String,
        amount: Decimal,
        #[arg(long)]
        reason: String,
    },
}

/// Subcommands for `coopdash update`.
#[derive(Subcommand, Debug)]
pub enum UpdateCommand {
    /// Replace a member's contact details
    User {
        id: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
    /// Correct a savings deposit
    Saving {
        id: String,
        amount: Decimal,
        /// Deposit date (YYYY-MM-DD) [default: now]
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

/// Records that can be deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeleteKind {
    User,
    Saving,
    Loan,
}

/// Arguments for `coopdash delete`.
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    #[arg(value_enum)]
    pub kind: DeleteKind,

    pub id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Subcommands for `coopdash check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file.
    Config,
    /// Test REST and WebSocket connectivity.
    Connection,
}
