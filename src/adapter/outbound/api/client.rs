//! REST API client for the cooperative backend.
//!
//! Thin request/response wrapper: the backend computes every total and
//! balance, the client only fetches and submits. Requests carry the bearer
//! token of the current session when one is set.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{
    Credentials, Loan, LoansPage, NewUser, PaymentsPage, PenaltiesPage, Saving, SavingsPage,
    Session, User, UserUpdate,
};
use crate::error::{Error, Result};

/// Acknowledgement returned by mutation endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiMessage {
    pub message: Option<String>,
    pub user_id: Option<serde_json::Value>,
}

impl ApiMessage {
    /// The server's message, or `fallback` when it sent none.
    #[must_use]
    pub fn or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Serialize)]
struct NewSaving<'a> {
    user_id: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

#[derive(Debug, Serialize)]
struct SavingUpdate {
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct NewLoan<'a> {
    user_id: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    issued_date: DateTime<Utc>,
    deadline: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct NewLoanPayment<'a> {
    user_id: &'a str,
    loan_id: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

#[derive(Debug, Serialize)]
struct NewPenalty<'a> {
    user_id: &'a str,
    reason: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    status: &'static str,
}

/// HTTP client for the cooperative REST API.
pub struct CoopApiClient {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl CoopApiClient {
    /// Create a client for `base_url` (no trailing slash required).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    /// Use `session` for subsequent requests.
    pub fn set_session(&self, session: Option<&Session>) {
        *self.token.write() = session.map(|s| s.access_token.clone());
    }

    #[must_use]
    pub fn has_session(&self) -> bool {
        self.token.read().is_some()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, url = %url, "API request");
        let builder = self.client.request(method, url);
        match self.token.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = check_status(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Mutation endpoints may answer with an empty or non-JSON body.
    async fn send_ack(&self, builder: RequestBuilder) -> Result<ApiMessage> {
        let response = check_status(builder.send().await?).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    /// Exchange credentials for a session and start using it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the server rejects the credentials.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        info!(email = %credentials.email, "Logging in");
        let session: Session = self
            .send(self.request(Method::POST, "/login").json(credentials))
            .await?;
        self.set_session(Some(&session));
        Ok(session)
    }

    /// Register a new member.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn signup(&self, user: &NewUser) -> Result<ApiMessage> {
        self.send_ack(self.request(Method::POST, "/api/signup").json(user))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.send(self.request(Method::GET, "/api/users")).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User> {
        self.send(
            self.request(Method::PUT, &format!("/api/users/{id}"))
                .json(update),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn delete_user(&self, id: &str) -> Result<ApiMessage> {
        self.send_ack(self.request(Method::DELETE, &format!("/api/users/{id}")))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn list_savings(&self) -> Result<SavingsPage> {
        self.send(self.request(Method::GET, "/api/savings")).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn add_saving(&self, user_id: &str, amount: Decimal) -> Result<Saving> {
        self.send(
            self.request(Method::POST, "/api/saving")
                .json(&NewSaving { user_id, amount }),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn update_saving(
        &self,
        id: &str,
        amount: Decimal,
        created_at: DateTime<Utc>,
    ) -> Result<Saving> {
        self.send(
            self.request(Method::PUT, &format!("/api/saving/{id}"))
                .json(&SavingUpdate { amount, created_at }),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn delete_saving(&self, id: &str) -> Result<ApiMessage> {
        self.send_ack(self.request(Method::DELETE, &format!("/api/saving/{id}")))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn list_loans(&self) -> Result<LoansPage> {
        self.send(self.request(Method::GET, "/api/loans")).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn add_loan(
        &self,
        user_id: &str,
        amount: Decimal,
        issued_date: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Result<Loan> {
        self.send(self.request(Method::POST, "/api/loan").json(&NewLoan {
            user_id,
            amount,
            issued_date,
            deadline,
        }))
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn delete_loan(&self, id: &str) -> Result<ApiMessage> {
        self.send_ack(self.request(Method::DELETE, &format!("/api/loan/{id}")))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn list_loan_payments(&self, loan_id: &str) -> Result<PaymentsPage> {
        self.send(self.request(Method::GET, &format!("/api/loan-payments/{loan_id}")))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn add_loan_payment(
        &self,
        user_id: &str,
        loan_id: &str,
        amount: Decimal,
    ) -> Result<ApiMessage> {
        self.send_ack(
            self.request(Method::POST, "/api/loan-payment")
                .json(&NewLoanPayment {
                    user_id,
                    loan_id,
                    amount,
                }),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn list_penalties(&self) -> Result<PenaltiesPage> {
        self.send(self.request(Method::GET, "/api/penalties")).await
    }

    /// New penalties always start unpaid.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn add_penalty(
        &self,
        user_id: &str,
        reason: &str,
        amount: Decimal,
    ) -> Result<ApiMessage> {
        self.send_ack(self.request(Method::POST, "/api/penalty").json(&NewPenalty {
            user_id,
            reason,
            amount,
            status: "unpaid",
        }))
        .await
    }

    /// Check that the API host answers HTTP at all.
    ///
    /// # Errors
    ///
    /// Returns an error only when no HTTP response is received.
    pub async fn probe(&self) -> Result<u16> {
        let response = self.client.get(&self.base_url).send().await?;
        Ok(response.status().as_u16())
    }
}

/// Turn a non-2xx response into [`Error::Api`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message: error_message(&body, status.canonical_reason().unwrap_or("request failed")),
    })
}

/// Pull `detail` or `message` from an error body, else use the raw text.
fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message"] {
            match value.get(key) {
                Some(serde_json::Value::String(text)) => return text.clone(),
                Some(serde_json::Value::Array(items)) => {
                    let joined: Vec<&str> = items
                        .iter()
                        .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                        .collect();
                    if !joined.is_empty() {
                        return joined.join("; ");
                    }
                }
                _ => {}
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
