//! Shared fixtures for `cmk-client` integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cmk_client::{ApiClient, ClientConfig, LoginError, LoginNavigator};
use tokio::sync::Notify;
use wiremock::MockServer;

pub const COOKIES: &str = "SESSION=s3cr3t; CSRF-t1=tok-1; CSRF-t2=tok-2";

/// Records login attempts; always succeeds.
#[derive(Default)]
pub struct CountingNavigator {
    calls: AtomicUsize,
}

impl CountingNavigator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LoginNavigator for CountingNavigator {
    async fn initiate_login(&self, _tenant_id: &str) -> Result<(), LoginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Holds the login attempt open until `release` is notified.
#[derive(Default)]
pub struct GatedNavigator {
    pub started: Notify,
    pub release: Notify,
    calls: AtomicUsize,
}

impl GatedNavigator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LoginNavigator for GatedNavigator {
    async fn initiate_login(&self, _tenant_id: &str) -> Result<(), LoginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

pub fn config(server: &MockServer, tenant: Option<&str>) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        tenant_id: tenant.map(str::to_owned),
        cookies: COOKIES.to_owned(),
        ..ClientConfig::default()
    }
}

/// Client scoped to tenant `t1` with a counting navigator.
pub fn client(server: &MockServer) -> (ApiClient, Arc<CountingNavigator>) {
    let nav = Arc::new(CountingNavigator::default());
    let client = ApiClient::new(&config(server, Some("t1")), nav.clone()).unwrap();
    (client, nav)
}
