//! Integration tests for the marketplace API.
//!
//! Scenarios drive the real router in-process: the same handlers,
//! extractors and middleware as production, backed by the in-memory store
//! and fake SMS, bank and clock collaborators.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketplace-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{DateTime, Duration, Local, Utc};
use mockable::Clock;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use marketplace_api::db::memory::MemoryStore;
use marketplace_api::services::auth::TokenService;
use marketplace_api::services::bank::{Bank, BankError, BankProvider, VerifiedAccount};
use marketplace_api::services::sms::{SmsError, SmsSender};
use marketplace_api::{AppState, Components, app};

pub const JWT_SECRET: &str = "q8F!vR2#kW7$zN4@hT1&yM6*pB3^sD9x";

/// Account number the stub bank resolves.
pub const KNOWN_ACCOUNT: &str = "0690000031";

/// A clock the test moves by hand. Starts at the real time because token
/// expiry is checked against the system clock.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps every SMS so a test can read the code back.
#[derive(Default)]
pub struct Outbox {
    sent: Mutex<Vec<(String, String)>>,
}

impl Outbox {
    /// The six-digit code from the most recent message.
    #[must_use]
    pub fn last_code(&self) -> Option<i32> {
        let sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        let (_, body) = sent.last()?;
        body.rsplit(' ').next()?.parse().ok()
    }

    #[must_use]
    pub fn recipients(&self) -> Vec<String> {
        let sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        sent.iter().map(|(to, _)| to.clone()).collect()
    }
}

#[async_trait]
impl SmsSender for Outbox {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        sent.push((to.to_owned(), body.to_owned()));
        Ok(())
    }
}

/// Bank provider with one bank and one resolvable account.
pub struct StubBank;

#[async_trait]
impl BankProvider for StubBank {
    async fn list_banks(&self, _country: &str) -> Result<Vec<Bank>, BankError> {
        Ok(vec![Bank {
            code: "044".to_owned(),
            name: "Access Bank".to_owned(),
        }])
    }

    async fn verify_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<VerifiedAccount, BankError> {
        if account_number == KNOWN_ACCOUNT {
            Ok(VerifiedAccount {
                account_number: account_number.to_owned(),
                account_name: "Forrest Green".to_owned(),
                bank_code: bank_code.to_owned(),
            })
        } else {
            Err(BankError::Provider("invalid account number".to_owned()))
        }
    }
}

/// One in-process application plus handles on its fakes.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
    pub outbox: Arc<Outbox>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// An app without a bank provider.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    #[must_use]
    pub fn with_bank() -> Self {
        Self::build(Some(Arc::new(StubBank)))
    }

    fn build(banks: Option<Arc<dyn BankProvider>>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let outbox = Arc::new(Outbox::default());
        let clock = Arc::new(ManualClock::new());

        let state = AppState::from_components(Components {
            users: store.clone(),
            catalogue: store.clone(),
            carts: store.clone(),
            tokens: TokenService::new(&SecretString::from(JWT_SECRET.to_owned())),
            sms: outbox.clone(),
            banks,
            clock: clock.clone(),
            pool: None,
        });

        Self {
            router: app(state),
            store,
            outbox,
            clock,
        }
    }

    /// Send one request and decode the JSON body (`Value::Null` if empty or
    /// not JSON).
    ///
    /// # Panics
    ///
    /// If the request cannot be built or the router fails.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Register a buyer and return their token.
    ///
    /// # Panics
    ///
    /// If registration does not succeed.
    pub async fn register(&self, email: &str, phone: &str) -> String {
        let (status, body) = self
            .post(
                "/register",
                None,
                json!({
                    "first_name": "Ada",
                    "last_name": "Obi",
                    "email": email,
                    "phone": phone,
                    "password": "correct-horse-battery",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        token_of(&body)
    }

    /// Register a user and upgrade them, returning the seller token.
    ///
    /// # Panics
    ///
    /// If either step fails.
    pub async fn seller(&self, email: &str, phone: &str) -> String {
        let buyer = self.register(email, phone).await;
        let (status, body) = self
            .post("/become-seller", Some(&buyer), seller_application(phone))
            .await;
        assert_eq!(status, StatusCode::OK, "become-seller failed: {body}");
        token_of(&body)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete `/become-seller` body.
#[must_use]
pub fn seller_application(phone: &str) -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Obi",
        "phone_number": phone,
        "bank_account_number": KNOWN_ACCOUNT,
        "bank_code": "044",
        "payment_type": "Access Bank",
    })
}

/// The `token` field of a response body.
///
/// # Panics
///
/// If the body carries no token.
#[must_use]
pub fn token_of(body: &Value) -> String {
    body["token"]
        .as_str()
        .expect("response carries a token")
        .to_owned()
}
