//! Record edits: signup, add, update and delete.
//!
//! Each handler makes one REST call and reports what the server
//! acknowledged. Amounts and dates are checked by the parser, everything
//! else is left to the backend.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use dialoguer::{Confirm, Password};
use tracing::info;

use crate::adapter::inbound::cli::command::{
    AddCommand, DeleteArgs, DeleteKind, SignupArgs, UpdateCommand,
};
use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::records::explain;
use crate::adapter::inbound::cli::session::authorized_client;
use crate::adapter::outbound::api::ApiMessage;
use crate::domain::format::format_whole;
use crate::domain::{NewUser, UserUpdate};
use crate::error::Result;
use crate::infrastructure::config::Config;

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn report(ack: &ApiMessage, fallback: &str) {
    output::success(&ack.or(fallback));
}

/// `coopdash signup`.
pub async fn execute_signup(config: &Config, args: SignupArgs) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };
    let user = NewUser {
        username: args.username,
        email: args.email,
        phone_number: args.phone,
        confirm_password: password.clone(),
        password,
    };

    let client = authorized_client(config)?;
    let ack = client.signup(&user).await.map_err(explain)?;
    info!(username = %user.username, "Member registered");

    report(&ack, &format!("Registered {}", user.username));
    match &ack.user_id {
        Some(serde_json::Value::String(id)) => output::field("Member ID", id),
        Some(id) if !id.is_null() => output::field("Member ID", id),
        _ => {}
    }
    Ok(())
}

/// `coopdash add <kind>`.
pub async fn execute_add(config: &Config, command: AddCommand) -> Result<()> {
    let client = authorized_client(config)?;

    match command {
        AddCommand::Saving { user_id, amount } => {
            let saving = client.add_saving(&user_id, amount).await.map_err(explain)?;
            output::success("Saving recorded");
            output::field("ID", &saving.id);
            output::field("Amount", format_whole(saving.amount));
        }
        AddCommand::Loan {
            user_id,
            amount,
            deadline,
            issued,
        } => {
            let issued = issued.map_or_else(Utc::now, start_of_day);
            let loan = client
                .add_loan(&user_id, amount, issued, start_of_day(deadline))
                .await
                .map_err(explain)?;
            output::success("Loan issued");
            output::field("ID", &loan.id);
            output::field("Amount", format_whole(loan.amount));
            output::field("Deadline", loan.deadline.as_deref().unwrap_or("-"));
        }
        AddCommand::Payment {
            user_id,
            loan_id,
            amount,
        } => {
            let ack = client
                .add_loan_payment(&user_id, &loan_id, amount)
                .await
                .map_err(explain)?;
            report(&ack, "Loan payment recorded");
        }
        AddCommand::Penalty {
            user_id,
            amount,
            reason,
        } => {
            let ack = client
                .add_penalty(&user_id, &reason, amount)
                .await
                .map_err(explain)?;
            report(&ack, "Penalty recorded");
        }
    }
    Ok(())
}

/// `coopdash update <kind>`.
pub async fn execute_update(config: &Config, command: UpdateCommand) -> Result<()> {
    let client = authorized_client(config)?;

    match command {
        UpdateCommand::User {
            id,
            username,
            email,
            phone,
        } => {
            let update = UserUpdate {
                username,
                email,
                phone_number: phone,
            };
            let user = client.update_user(&id, &update).await.map_err(explain)?;
            output::success("Member updated");
            output::field("Name", &user.username);
            output::field("Email", &user.email);
        }
        UpdateCommand::Saving { id, amount, date } => {
            let created_at = date.map_or_else(Utc::now, start_of_day);
            let saving = client
                .update_saving(&id, amount, created_at)
                .await
                .map_err(explain)?;
            output::success("Saving updated");
            output::field("Amount", format_whole(saving.amount));
        }
    }
    Ok(())
}

/// `coopdash delete <kind> <id>`, confirming first unless `--yes`.
pub async fn execute_delete(config: &Config, args: DeleteArgs) -> Result<()> {
    let noun = match args.kind {
        DeleteKind::User => "member",
        DeleteKind::Saving => "saving",
        DeleteKind::Loan => "loan",
    };
    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {noun} {}?", args.id))
            .default(false)
            .interact()?;
        if !confirmed {
            output::warning("Aborted");
            return Ok(());
        }
    }

    let client = authorized_client(config)?;
    let ack = match args.kind {
        DeleteKind::User => client.delete_user(&args.id).await,
        DeleteKind::Saving => client.delete_saving(&args.id).await,
        DeleteKind::Loan => client.delete_loan(&args.id).await,
    }
    .map_err(explain)?;

    info!(kind = noun, id = %args.id, "Record deleted");
    report(&ack, &format!("Deleted {noun} {}", args.id));
    Ok(())
}
