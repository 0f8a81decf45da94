//! Application state shared across handlers.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::db::{
    CartRepository, CatalogueRepository, PgCartRepository, PgCatalogueRepository,
    PgUserRepository, UserRepository,
};
use crate::services::auth::{AuthService, TokenService};
use crate::services::bank::{BankError, BankProvider, FlutterwaveClient};
use crate::services::cart::CartService;
use crate::services::catalogue::CatalogueService;
use crate::services::sms::{SmsError, SmsSender, TwilioClient};
use crate::services::users::UserService;
use crate::services::verification::VerificationService;

/// Error building the outbound clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("sms client: {0}")]
    Sms(#[from] SmsError),
    #[error("bank client: {0}")]
    Bank(#[from] BankError),
}

/// Everything handlers need, assembled by the caller.
///
/// [`AppState::new`] wires the production set; tests build one directly
/// with in-memory repositories and fakes.
pub struct Components {
    pub users: Arc<dyn UserRepository>,
    pub catalogue: Arc<dyn CatalogueRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub tokens: TokenService,
    pub sms: Arc<dyn SmsSender>,
    /// `None` when no bank provider is configured.
    pub banks: Option<Arc<dyn BankProvider>>,
    pub clock: Arc<dyn Clock>,
    /// Present only for the Postgres-backed state; used by readiness.
    pub pool: Option<PgPool>,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Components>,
}

impl AppState {
    /// Create the production state: Postgres repositories, Twilio and,
    /// when configured, Flutterwave.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: &ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let banks: Option<Arc<dyn BankProvider>> = match &config.flutterwave {
            Some(flutterwave) => Some(Arc::new(FlutterwaveClient::new(flutterwave)?)),
            None => {
                tracing::warn!("FLUTTERWAVE_SECRET_KEY not set; bank endpoints will return 503");
                None
            }
        };

        Ok(Self::from_components(Components {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            catalogue: Arc::new(PgCatalogueRepository::new(pool.clone())),
            carts: Arc::new(PgCartRepository::new(pool.clone())),
            tokens: TokenService::new(&config.jwt_secret),
            sms: Arc::new(TwilioClient::new(&config.twilio)?),
            banks,
            clock: Arc::new(DefaultClock),
            pool: Some(pool),
        }))
    }

    #[must_use]
    pub fn from_components(components: Components) -> Self {
        Self {
            inner: Arc::new(components),
        }
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserRepository {
        self.inner.users.as_ref()
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// The bank provider, if one is configured.
    #[must_use]
    pub fn banks(&self) -> Option<&dyn BankProvider> {
        self.inner.banks.as_deref()
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    // Services are cheap borrows over the shared components.

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            self.inner.users.as_ref(),
            &self.inner.tokens,
            self.inner.clock.as_ref(),
        )
    }

    #[must_use]
    pub fn user_service(&self) -> UserService<'_> {
        UserService::new(
            self.inner.users.as_ref(),
            &self.inner.tokens,
            self.inner.clock.as_ref(),
        )
    }

    #[must_use]
    pub fn verification(&self) -> VerificationService<'_> {
        VerificationService::new(
            self.inner.users.as_ref(),
            self.inner.sms.as_ref(),
            self.inner.clock.as_ref(),
        )
    }

    #[must_use]
    pub fn catalogue(&self) -> CatalogueService<'_> {
        CatalogueService::new(self.inner.catalogue.as_ref())
    }

    #[must_use]
    pub fn cart(&self) -> CartService<'_> {
        CartService::new(self.inner.carts.as_ref(), self.inner.catalogue.as_ref())
    }
}
