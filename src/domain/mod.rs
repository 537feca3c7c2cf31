//! Transport-free domain types.

pub mod format;
pub mod record;
pub mod session;
pub mod stats;

pub use record::{
    Loan, LoanPayment, LoansPage, NewUser, PaymentsPage, PenaltiesPage, Penalty, PenaltyStatus,
    Saving, SavingsPage, User, UserUpdate,
};
pub use session::{Credentials, Session};
pub use stats::AggregateStats;
