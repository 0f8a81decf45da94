//! Fakes for the external collaborators, shared by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use secrecy::SecretString;

use crate::services::auth::TokenService;
use crate::services::bank::{Bank, BankError, BankProvider, VerifiedAccount};
use crate::services::sms::{SmsError, SmsSender};

pub(crate) const TEST_JWT_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6e";

pub(crate) fn token_service() -> TokenService {
    TokenService::new(&SecretString::from(TEST_JWT_SECRET.to_owned()))
}

/// Records messages instead of sending them.
#[derive(Default)]
pub(crate) struct RecordingSms {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSms {
    pub(crate) fn messages(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((to.to_owned(), body.to_owned()));
        }
        Ok(())
    }
}

pub(crate) struct FailingSms;

#[async_trait]
impl SmsSender for FailingSms {
    async fn send(&self, _to: &str, _body: &str) -> Result<(), SmsError> {
        Err(SmsError::Api {
            status: 400,
            message: "unreachable handset".to_owned(),
        })
    }
}

pub(crate) struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl FixtureClock {
    /// 2024-01-01 12:`minute`:00 UTC.
    pub(crate) fn at_minute(minute: u32) -> Self {
        Self {
            utc_now: Utc
                .with_ymd_and_hms(2024, 1, 1, 12, minute, 0)
                .single()
                .unwrap_or_default(),
        }
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

/// Bank provider answering from a fixed table.
pub(crate) struct StubBank;

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
        if account_number == "0690000031" {
            Ok(VerifiedAccount {
                account_number: account_number.to_owned(),
                account_name: "Forrest Green".to_owned(),
                bank_code: bank_code.to_owned(),
            })
        } else {
            Err(BankError::Provider(
                "Sorry, that account number is invalid".to_owned(),
            ))
        }
    }
}
