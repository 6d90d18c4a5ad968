//! Session state: tenant selection, CSRF token, and per-user data.
//!
//! A [`Session`] is created when the client is built and lives as long as it.
//! The tenant-dependent pieces (request base path and CSRF token) live
//! together in a [`TenantContext`] so that a tenant switch swaps both in one
//! step.

use std::borrow::Cow;

use crate::types::{Tenant, UserInfo};

/// Base name of the per-tenant anti-forgery cookie.
pub const CSRF_COOKIE_PREFIX: &str = "CSRF";

/// Name of the CSRF cookie for a tenant, e.g. `CSRF-tenant1`.
#[must_use]
pub fn csrf_cookie_name(tenant_id: &str) -> String {
    format!("{CSRF_COOKIE_PREFIX}-{tenant_id}")
}

/// Cookies the session was established with, as a raw `Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    raw: String,
}

impl CookieJar {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Raw header value, `None` when no cookies are set.
    #[must_use]
    pub fn header_value(&self) -> Option<&str> {
        let trimmed = self.raw.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Value of the named cookie.
    ///
    /// The whole cookie string is percent-decoded before it is split on `;`.
    /// When a name appears more than once the last occurrence wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let decoded =
            urlencoding::decode(&self.raw).unwrap_or(Cow::Borrowed(self.raw.as_str()));
        decoded
            .split(';')
            .map(|cookie| cookie.trim_start_matches(' '))
            .filter_map(|cookie| cookie.strip_prefix(name)?.strip_prefix('='))
            .next_back()
            .map(str::to_owned)
    }

    /// CSRF token for a tenant.
    #[must_use]
    pub fn csrf_token(&self, tenant_id: &str) -> Option<String> {
        self.get(&csrf_cookie_name(tenant_id))
    }
}

/// Where requests go and which CSRF token they carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: Option<String>,
    base_path: String,
    csrf_token: Option<String>,
}

impl TenantContext {
    /// Context before any tenant is selected: requests go to the API root.
    pub(crate) fn root(api_root: &str) -> Self {
        Self {
            tenant_id: None,
            base_path: api_root.to_owned(),
            csrf_token: None,
        }
    }

    pub(crate) fn for_tenant(api_root: &str, tenant_id: &str, jar: &CookieJar) -> Self {
        Self {
            tenant_id: Some(tenant_id.to_owned()),
            base_path: format!("{api_root}/{}", urlencoding::encode(tenant_id)),
            csrf_token: jar.csrf_token(tenant_id),
        }
    }

    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Absolute request base, e.g. `https://host/cmk/v1/tenant1`.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// Absolute URL of a resource path relative to the base.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_path, path.trim_start_matches('/'))
    }
}

/// Everything the client remembers about the signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    api_root: String,
    cookies: CookieJar,
    tenant: TenantContext,
    tenant_name: Option<String>,
    tenants: Option<Vec<Tenant>>,
    user: Option<UserInfo>,
}

impl Session {
    pub(crate) fn new(api_root: String, cookies: CookieJar) -> Self {
        let tenant = TenantContext::root(&api_root);
        Self {
            api_root,
            cookies,
            tenant,
            tenant_name: None,
            tenants: None,
            user: None,
        }
    }

    /// Select a tenant. Base path and CSRF token change together; the
    /// tenant display name and user info belong to the old tenant and are
    /// dropped.
    pub(crate) fn switch_tenant(&mut self, tenant_id: &str) {
        self.tenant = TenantContext::for_tenant(&self.api_root, tenant_id, &self.cookies);
        self.tenant_name = self
            .tenants
            .as_ref()
            .and_then(|list| list.iter().find(|t| t.id == tenant_id))
            .map(|t| t.name.clone());
        self.user = None;
    }

    /// Forget tenant and user; requests go to the API root again.
    pub(crate) fn reset(&mut self) {
        self.tenant = TenantContext::root(&self.api_root);
        self.tenant_name = None;
        self.tenants = None;
        self.user = None;
    }

    /// Replace the cookies (e.g. after a fresh login) and re-derive the
    /// CSRF token of the current tenant.
    pub(crate) fn set_cookies(&mut self, cookies: CookieJar) {
        self.cookies = cookies;
        if let Some(id) = self.tenant.tenant_id().map(str::to_owned) {
            self.tenant = TenantContext::for_tenant(&self.api_root, &id, &self.cookies);
        }
    }

    pub(crate) fn set_tenant_name(&mut self, name: String) {
        self.tenant_name = Some(name);
    }

    pub(crate) fn set_tenants(&mut self, tenants: Vec<Tenant>) {
        self.tenants = Some(tenants);
    }

    pub(crate) fn set_user(&mut self, user: UserInfo) {
        self.user = Some(user);
    }

    #[must_use]
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    #[must_use]
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    #[must_use]
    pub fn tenant(&self) -> &TenantContext {
        &self.tenant
    }

    #[must_use]
    pub fn tenant_name(&self) -> Option<&str> {
        self.tenant_name.as_deref()
    }

    /// Tenants discovered via the tenant listing, if it ran.
    #[must_use]
    pub fn tenants(&self) -> Option<&[Tenant]> {
        self.tenants.as_deref()
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }
}
