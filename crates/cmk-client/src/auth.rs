//! Session-expiry recovery.
//!
//! When a request comes back 401 the client starts a login redirect, but
//! only once: if many requests fail together after the session expires, the
//! first one starts the redirect, the others are ignored while it is in
//! flight, and anything failing after a completed redirect is reported as
//! [`AccessErrorCode::AuthenticationFailed`].

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::error::{AccessError, AccessErrorCode, LoginError};

/// Starts an interactive login for a tenant.
///
/// In a browser this navigates away; headless consumers typically surface
/// the [`LoginUrl`] to the user.
#[async_trait::async_trait]
pub trait LoginNavigator: Send + Sync + 'static {
    /// Begin the login flow.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError`] if the login could not be started.
    async fn initiate_login(&self, tenant_id: &str) -> Result<(), LoginError>;
}

/// Navigator for non-interactive use: every login attempt fails, so the
/// first 401 becomes an `AUTHENTICATION_FAILED` error.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectLogin;

#[async_trait::async_trait]
impl LoginNavigator for RejectLogin {
    async fn initiate_login(&self, _tenant_id: &str) -> Result<(), LoginError> {
        Err(LoginError {
            reason: "interactive login is not available".to_owned(),
        })
    }
}

/// Builder for the identity provider's login URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginUrl {
    auth_base: String,
}

impl LoginUrl {
    #[must_use]
    pub fn new(auth_base: &str) -> Self {
        Self {
            auth_base: auth_base.trim_end_matches('/').to_owned(),
        }
    }

    /// Login URL that returns the user to `return_to` afterwards.
    #[must_use]
    pub fn for_return(&self, tenant_id: &str, return_to: &str) -> String {
        format!(
            "{}/sm/auth?tenant_id={}&request_uri={}",
            self.auth_base,
            urlencoding::encode(tenant_id),
            urlencoding::encode(return_to)
        )
    }

    /// Login URL used by the "retry login" action: lands on the tenant's key
    /// configuration list.
    #[must_use]
    pub fn for_retry(&self, tenant_id: &str, origin: &str, path: &str) -> String {
        let return_to = format!("{origin}{path}#/{tenant_id}/keyConfigs");
        self.for_return(tenant_id, &return_to)
    }
}

/// Where the client is in the 401 recovery protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No authentication error seen yet.
    #[default]
    Normal,
    /// A login redirect is being started; further 401s are ignored.
    LoginInFlight,
    /// A login redirect was started; further 401s are errors.
    FirstErrorHandled,
}

pub(crate) struct AuthRecovery {
    state: Mutex<AuthState>,
    navigator: Arc<dyn LoginNavigator>,
}

impl AuthRecovery {
    pub(crate) fn new(navigator: Arc<dyn LoginNavigator>) -> Self {
        Self {
            state: Mutex::new(AuthState::Normal),
            navigator,
        }
    }

    pub(crate) async fn state(&self) -> AuthState {
        *self.state.lock().await
    }

    /// Handle a 401.
    ///
    /// `Ok(())` means the error was absorbed (a redirect was started or is
    /// already running) and the request resolves without a value.
    pub(crate) async fn handle_unauthorized(&self, tenant_id: &str) -> Result<(), AccessError> {
        {
            let mut state = self.state.lock().await;
            match *state {
                AuthState::LoginInFlight => {
                    warn!("authentication error while login in progress, ignoring");
                    return Ok(());
                }
                AuthState::FirstErrorHandled => {
                    warn!("authentication error after login redirect");
                    return Err(AccessError::new(
                        AccessErrorCode::AuthenticationFailed,
                        "session could not be re-established",
                    ));
                }
                AuthState::Normal => *state = AuthState::LoginInFlight,
            }
        }

        warn!(tenant_id, "authentication error detected, initiating login");
        // The lock is released while the navigator runs so concurrent 401s
        // observe LoginInFlight.
        let outcome = self.navigator.initiate_login(tenant_id).await;
        let mut state = self.state.lock().await;
        match outcome {
            Ok(()) => {
                *state = AuthState::FirstErrorHandled;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "login initiation failed");
                *state = AuthState::Normal;
                Err(AccessError::new(
                    AccessErrorCode::AuthenticationFailed,
                    e.to_string(),
                ))
            }
        }
    }
}
