//! Bank directory and account-name lookup.
//!
//! [`BankProvider`] is optional at runtime: without `FLUTTERWAVE_SECRET_KEY`
//! no provider is built and the bank endpoints answer 503.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FlutterwaveConfig;

/// Errors that can occur when talking to the bank provider.
#[derive(Debug, Error)]
pub enum BankError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered, but not with a usable result.
    #[error("provider error: {0}")]
    Provider(String),

    /// Failed to build the client.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A bank as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub code: String,
    pub name: String,
}

/// A resolved account holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedAccount {
    pub account_number: String,
    pub account_name: String,
    pub bank_code: String,
}

/// Bank directory and account verification.
#[async_trait]
pub trait BankProvider: Send + Sync {
    async fn list_banks(&self, country: &str) -> Result<Vec<Bank>, BankError>;

    async fn verify_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<VerifiedAccount, BankError>;
}

/// Flutterwave envelope: `{ status, message, data }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ResolvedAccount {
    account_number: String,
    account_name: String,
}

/// Flutterwave API client.
#[derive(Clone)]
pub struct FlutterwaveClient {
    client: reqwest::Client,
    base_url: String,
}

impl FlutterwaveClient {
    /// Create a new Flutterwave client.
    ///
    /// # Errors
    ///
    /// Returns error if the secret is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &FlutterwaveConfig) -> Result<Self, BankError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| BankError::Config(format!("Invalid secret key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn read<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BankError> {
        let status = response.status();
        let body = response.text().await?;

        // Gateways in front of the API answer outages with HTML pages.
        if body.trim_start().starts_with('<') {
            return Err(BankError::Provider(format!(
                "unexpected HTML response (status {status})"
            )));
        }
        if !status.is_success() {
            return Err(BankError::Provider(format!("status {status}: {body}")));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| BankError::Provider(format!("malformed response: {e}")))?;
        if envelope.status != "success" {
            return Err(BankError::Provider(envelope.message));
        }
        envelope
            .data
            .ok_or_else(|| BankError::Provider("response has no data".to_owned()))
    }
}

#[async_trait]
impl BankProvider for FlutterwaveClient {
    async fn list_banks(&self, country: &str) -> Result<Vec<Bank>, BankError> {
        let url = format!("{}/banks?country={country}", self.base_url);
        let response = self.client.get(&url).send().await?;

        Self::read(response).await
    }

    async fn verify_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<VerifiedAccount, BankError> {
        let url = format!("{}/v3/accounts/resolve", self.base_url);
        let body = serde_json::json!({
            "account_number": account_number,
            "account_bank": bank_code,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let resolved: ResolvedAccount = Self::read(response).await?;

        Ok(VerifiedAccount {
            account_number: resolved.account_number,
            account_name: resolved.account_name,
            bank_code: bank_code.to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_parses_bank_list() {
        let body = r#"{"status":"success","message":"Banks fetched","data":[{"id":1,"code":"044","name":"Access Bank"}]}"#;
        let envelope: Envelope<Vec<Bank>> = serde_json::from_str(body).unwrap();

        assert_eq!(envelope.status, "success");
        assert_eq!(
            envelope.data.unwrap(),
            vec![Bank {
                code: "044".to_owned(),
                name: "Access Bank".to_owned()
            }]
        );
    }

    #[test]
    fn test_envelope_error_has_no_data() {
        let body = r#"{"status":"error","message":"Sorry, that account number is invalid","data":null}"#;
        let envelope: Envelope<ResolvedAccount> = serde_json::from_str(body).unwrap();

        assert_eq!(envelope.status, "error");
        assert!(envelope.data.is_none());
    }
}
