//! The tenant-scoped HTTP client.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::auth::{AuthRecovery, AuthState, LoginNavigator};
use crate::config::ClientConfig;
use crate::error::{AccessError, AccessErrorCode, ApiError, HttpError};
use crate::session::{CookieJar, Session, TenantContext};
use crate::types::{Tenant, UserInfo};
use crate::USER_AGENT;

/// Content type of every request except `PATCH`.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type of `PATCH` requests.
pub const MERGE_PATCH_CONTENT_TYPE: &str = "application/merge-patch+json";
/// Header carrying the per-tenant anti-forgery token.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// A primitive query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for QueryValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// `$top`/`$skip` pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub top: u32,
    pub skip: u32,
}

impl Page {
    #[must_use]
    pub const fn new(top: u32, skip: u32) -> Self {
        Self { top, skip }
    }

    /// The `page`-th window (1-based) of `size` items.
    #[must_use]
    pub const fn number(page: u32, size: u32) -> Self {
        Self {
            top: size,
            skip: page.saturating_sub(1).saturating_mul(size),
        }
    }

    /// Pages needed to show `count` items.
    #[must_use]
    pub fn total_pages(self, count: u64) -> u64 {
        if self.top == 0 {
            return 0;
        }
        count.div_ceil(u64::from(self.top))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(10, 0)
    }
}

/// What a successful round trip produced.
enum Reply<T> {
    Body(T),
    Empty,
    /// A 401 was absorbed by the login redirect; the request had no effect.
    LoginPending,
}

impl<T> Reply<T> {
    fn into_option(self) -> Option<T> {
        match self {
            Self::Body(v) => Some(v),
            Self::Empty | Self::LoginPending => None,
        }
    }
}

/// Query parameters for `GET` requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, QueryValue>);

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        self.0.insert(key.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn page(self, page: Page) -> Self {
        self.with("$top", page.top).with("$skip", page.skip)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    fn pairs(&self) -> Vec<(&str, String)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.to_string())).collect()
    }
}

/// Client for one console session.
///
/// Build it once and share it (`Arc<ApiClient>`) with every collaborator.
/// Content type and CSRF header are computed per request from the current
/// [`TenantContext`], so concurrent calls never see each other's headers.
pub struct ApiClient {
    http: reqwest::Client,
    session: RwLock<Session>,
    auth: AuthRecovery,
}

impl ApiClient {
    /// Build a client.
    ///
    /// The client starts at the API root; call
    /// [`switch_tenant`](Self::switch_tenant) before using tenant routes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &ClientConfig, navigator: Arc<dyn LoginNavigator>) -> Result<Self, ApiError> {
        let api_root = config
            .api_root()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        let mut session = Session::new(api_root, CookieJar::new(config.cookies.clone()));
        if let Some(tenant_id) = config.tenant_id.as_deref() {
            session.switch_tenant(tenant_id);
        }

        Ok(Self {
            http,
            session: RwLock::new(session),
            auth: AuthRecovery::new(navigator),
        })
    }

    // --- Session ---

    /// Select the tenant all following requests are scoped to.
    pub async fn switch_tenant(&self, tenant_id: &str) {
        self.session.write().await.switch_tenant(tenant_id);
        debug!(tenant_id, "switched tenant");
    }

    /// Drop tenant and user state (logout).
    pub async fn end_session(&self) {
        self.session.write().await.reset();
    }

    /// Replace the session cookies, e.g. after logging in again.
    pub async fn set_cookies(&self, cookies: CookieJar) {
        self.session.write().await.set_cookies(cookies);
    }

    /// Snapshot of the current tenant context.
    pub async fn tenant(&self) -> TenantContext {
        self.session.read().await.tenant().clone()
    }

    pub async fn tenant_id(&self) -> Option<String> {
        self.session.read().await.tenant().tenant_id().map(str::to_owned)
    }

    pub async fn tenant_name(&self) -> Option<String> {
        self.session.read().await.tenant_name().map(str::to_owned)
    }

    pub async fn set_tenant_name(&self, name: impl Into<String>) {
        self.session.write().await.set_tenant_name(name.into());
    }

    /// Tenants cached by the last tenant listing.
    pub async fn tenants(&self) -> Option<Vec<Tenant>> {
        self.session.read().await.tenants().map(<[Tenant]>::to_vec)
    }

    pub(crate) async fn cache_tenants(&self, tenants: Vec<Tenant>) {
        self.session.write().await.set_tenants(tenants);
    }

    pub async fn user_info(&self) -> Option<UserInfo> {
        self.session.read().await.user().cloned()
    }

    pub async fn set_user_info(&self, user: UserInfo) {
        self.session.write().await.set_user(user);
    }

    /// Current step of the 401 recovery protocol.
    pub async fn auth_state(&self) -> AuthState {
        self.auth.state().await
    }

    // --- Verbs ---

    /// `GET` a resource. `$count=true` is always added so list endpoints
    /// return their total.
    ///
    /// Returns `Ok(None)` when the body is empty or a 401 was absorbed by
    /// the login redirect.
    ///
    /// # Errors
    ///
    /// See [`ApiError`]: access errors for classified 401/403 responses,
    /// [`ApiError::Http`] for any other failure status.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<Option<T>, ApiError> {
        let params = params.clone().with("$count", true);
        self.execute(Method::GET, path, JSON_CONTENT_TYPE, Some(&params), None)
            .await
            .map(Reply::into_option)
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<Option<R>, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_vec(body)?;
        self.execute(Method::POST, path, JSON_CONTENT_TYPE, None, Some(body))
            .await
            .map(Reply::into_option)
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<Option<R>, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_vec(body)?;
        self.execute(Method::PUT, path, JSON_CONTENT_TYPE, None, Some(body))
            .await
            .map(Reply::into_option)
    }

    /// `PATCH` with a JSON merge-patch body.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn patch<B, R>(&self, path: &str, body: &B) -> Result<Option<R>, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_vec(body)?;
        self.execute(Method::PATCH, path, MERGE_PATCH_CONTENT_TYPE, None, Some(body))
            .await
            .map(Reply::into_option)
    }

    /// `DELETE` a resource.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        self.execute(Method::DELETE, path, JSON_CONTENT_TYPE, None, None)
            .await
            .map(Reply::into_option)
    }

    /// Send a mutation whose response body is not needed.
    ///
    /// Returns `Ok(Some(()))` once the backend accepted the change and
    /// `Ok(None)` when a 401 was absorbed by the login redirect, in which
    /// case nothing was changed.
    pub(crate) async fn mutate<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<()>, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let content_type = if method == Method::PATCH {
            MERGE_PATCH_CONTENT_TYPE
        } else {
            JSON_CONTENT_TYPE
        };
        let body = body.map(serde_json::to_vec).transpose()?;
        let reply: Reply<Value> = self.execute(method, path, content_type, None, body).await?;
        Ok(match reply {
            Reply::LoginPending => None,
            Reply::Body(_) | Reply::Empty => Some(()),
        })
    }

    // --- Private ---

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        content_type: &'static str,
        query: Option<&QueryParams>,
        body: Option<Vec<u8>>,
    ) -> Result<Reply<T>, ApiError> {
        // Snapshot the tenant once so URL and CSRF token always match.
        let (tenant, cookies) = {
            let session = self.session.read().await;
            (
                session.tenant().clone(),
                session.cookies().header_value().map(str::to_owned),
            )
        };
        let url = tenant.url(path);

        let mut req = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, content_type);
        if let Some(token) = tenant.csrf_token() {
            req = req.header(CSRF_HEADER, token);
        }
        if let Some(cookies) = cookies {
            req = req.header(COOKIE, cookies);
        }
        if let Some(query) = query {
            req = req.query(&query.pairs());
        }
        if let Some(body) = body {
            req = req.body(body);
        }

        debug!(%method, %url, "cmk request");
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Reply::Empty);
            }
            return serde_json::from_str(&text)
                .map(Reply::Body)
                .map_err(ApiError::Json);
        }

        debug!(%method, %url, status = status.as_u16(), "cmk request failed");
        let error = http_error(status, &text);
        self.classify(error, tenant.tenant_id().unwrap_or_default())
            .await
            .map(|()| Reply::LoginPending)
    }

    async fn classify(&self, error: HttpError, tenant_id: &str) -> Result<(), ApiError> {
        match error.status() {
            401 => self
                .auth
                .handle_unauthorized(tenant_id)
                .await
                .map_err(ApiError::from),
            403 => Err(classify_forbidden(error)),
            _ => Err(ApiError::Http(error)),
        }
    }
}

fn http_error(status: StatusCode, text: &str) -> HttpError {
    let payload = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
    };
    let status_text = status
        .canonical_reason()
        .map_or_else(|| status.as_str().to_owned(), str::to_owned);
    HttpError::new(status.as_u16(), status_text, payload)
}

/// Map a 403 onto a typed access error. Unknown codes pass the HTTP error
/// through unchanged.
pub(crate) fn classify_forbidden(error: HttpError) -> ApiError {
    match error.error_code().and_then(AccessErrorCode::from_code) {
        Some(code) => {
            let message = error
                .data_message()
                .unwrap_or_else(|| code.description())
                .to_owned();
            ApiError::Access(AccessError::new(code, message))
        }
        None => ApiError::Http(error),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_number_computes_skip() {
        assert_eq!(Page::number(1, 10), Page::new(10, 0));
        assert_eq!(Page::number(3, 25), Page::new(25, 50));
        assert_eq!(Page::number(0, 10), Page::new(10, 0));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Page::new(10, 0).total_pages(0), 0);
        assert_eq!(Page::new(10, 0).total_pages(10), 1);
        assert_eq!(Page::new(10, 0).total_pages(11), 2);
        assert_eq!(Page::new(0, 0).total_pages(11), 0);
    }

    #[test]
    fn query_params_render_primitives() {
        let params = QueryParams::new()
            .page(Page::new(5, 10))
            .with("expandGroup", true)
            .with("keyConfigurationID", "kc-1");
        let pairs = params.pairs();
        assert!(pairs.contains(&("$top", "5".to_owned())));
        assert!(pairs.contains(&("$skip", "10".to_owned())));
        assert!(pairs.contains(&("expandGroup", "true".to_owned())));
        assert!(pairs.contains(&("keyConfigurationID", "kc-1".to_owned())));
    }

    #[test]
    fn forbidden_with_known_code_becomes_access_error() {
        let err = HttpError::new(
            403,
            "Forbidden",
            json!({ "error": { "code": "NO_TENANT_ACCESS" } }),
        );
        let classified = classify_forbidden(err);
        assert_eq!(classified.access_code(), Some(AccessErrorCode::NoTenantAccess));
    }

    #[test]
    fn forbidden_with_unknown_code_passes_through_unchanged() {
        let err = HttpError::new(403, "Forbidden", json!({ "error": { "code": "QUOTA" } }));
        let classified = classify_forbidden(err.clone());
        assert_eq!(classified.http(), Some(&err));
    }

    #[test]
    fn non_json_error_body_is_kept_as_string() {
        let err = http_error(StatusCode::BAD_GATEWAY, "upstream unavailable");
        assert_eq!(err.payload(), &Value::String("upstream unavailable".into()));
        assert_eq!(err.status_text(), "Bad Gateway");
    }

    #[test]
    fn non_standard_status_falls_back_to_numeric_text() {
        let status = StatusCode::from_u16(599).unwrap();
        let err = http_error(status, "");
        assert_eq!(err.status_text(), "599");
        assert_eq!(err.payload(), &Value::Null);
    }
}
