//! Terminal login handling.
//!
//! A CLI cannot follow a browser redirect, so an expired session is
//! reported as a login URL the user opens manually. Afterwards the new
//! session cookies are passed back in via `CMK_COOKIES`.

use cmk_client::{LoginError, LoginNavigator, LoginUrl};

use crate::{BOLD, CYAN, RESET, YELLOW};

pub struct TerminalLogin {
    login: Option<LoginUrl>,
    return_to: String,
}

impl TerminalLogin {
    pub fn new(auth_url: Option<&str>, return_to: &str) -> Self {
        Self {
            login: auth_url.map(LoginUrl::new),
            return_to: return_to.to_owned(),
        }
    }

    /// Where the user should log in, if an identity provider is configured.
    pub fn url(&self, tenant_id: &str) -> Option<String> {
        self.login
            .as_ref()
            .map(|login| login.for_return(tenant_id, &self.return_to))
    }
}

#[async_trait::async_trait]
impl LoginNavigator for TerminalLogin {
    async fn initiate_login(&self, tenant_id: &str) -> Result<(), LoginError> {
        let Some(url) = self.url(tenant_id) else {
            return Err(LoginError {
                reason: "session expired and CMK_AUTH_URL is not set".into(),
            });
        };
        eprintln!();
        eprintln!("  {YELLOW}{BOLD}⚠ Session expired.{RESET} Log in again at:");
        eprintln!("    {CYAN}{url}{RESET}");
        eprintln!("  then export the new session cookies as CMK_COOKIES.");
        eprintln!();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn url_requires_auth_base() {
        let login = TerminalLogin::new(None, "https://console.example.com");
        assert!(login.url("t1").is_none());

        let login = TerminalLogin::new(
            Some("https://idp.example.com/"),
            "https://console.example.com",
        );
        let url = login.url("t1").unwrap();
        assert!(url.starts_with("https://idp.example.com/sm/auth?tenant_id=t1&request_uri="));
        assert!(url.contains("https%3A%2F%2Fconsole.example.com"));
    }

    #[tokio::test]
    async fn missing_auth_base_fails_login() {
        let login = TerminalLogin::new(None, "https://console.example.com");
        assert!(login.initiate_login("t1").await.is_err());
    }
}
