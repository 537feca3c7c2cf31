//! Login session commands.

use dialoguer::{Input, Password};
use tracing::debug;

use crate::adapter::inbound::cli::command::LoginArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::api::CoopApiClient;
use crate::domain::Credentials;
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::infrastructure::session::{SessionStore, TOKEN_ENV};

/// REST client carrying the stored session, if there is one.
pub(crate) fn authorized_client(config: &Config) -> Result<CoopApiClient> {
    let client = api_client(config)?;
    let session = SessionStore::from_config(&config.session)?.resolve()?;
    if session.is_none() {
        debug!("No stored session, sending anonymous requests");
    }
    client.set_session(session.as_ref());
    Ok(client)
}

pub(crate) fn api_client(config: &Config) -> Result<CoopApiClient> {
    CoopApiClient::new(
        &config.network.api_url,
        std::time::Duration::from_secs(config.network.request_timeout_secs),
    )
}

/// Exchange credentials for a token and store it.
pub async fn execute_login(config: &Config, args: LoginArgs) -> Result<()> {
    let email = match args.email {
        Some(email) => email,
        None => Input::<String>::new().with_prompt("Email").interact_text()?,
    };
    let password = match args.password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };

    let store = SessionStore::from_config(&config.session)?;
    let client = api_client(config)?;

    let pb = output::spinner("Logging in...");
    let session = match client.login(&Credentials { email, password }).await {
        Ok(session) => session,
        Err(e) => {
            output::spinner_fail(&pb, "Login failed");
            return Err(e);
        }
    };
    store.save(&session)?;

    let who = session.display_name().unwrap_or("administrator");
    output::spinner_success(&pb, &format!("Logged in as {who}"));
    output::field("Session", store.path().display());
    Ok(())
}

/// Forget the stored token.
pub fn execute_logout(config: &Config) -> Result<()> {
    let store = SessionStore::from_config(&config.session)?;
    if store.clear()? {
        output::success("Logged out");
    } else {
        output::warning("No stored session");
    }
    if std::env::var_os(TOKEN_ENV).is_some() {
        output::hint(&format!("{TOKEN_ENV} is still set in the environment"));
    }
    Ok(())
}
