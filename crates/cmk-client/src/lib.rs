//! Client library for the CMK key-management API.
//!
//! Talks to the tenant-scoped REST backend (`<base>/cmk/v1/<tenantId>/…`),
//! attaches the per-tenant CSRF token, recovers from expired sessions by
//! starting a login redirect exactly once, and gates sensitive mutations
//! behind the backend's approval workflows.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use cmk_client::{
//!     ActionType, ApiClient, ArtifactType, ClientConfig, RejectLogin, WorkflowCheck,
//!     WorkflowGate, WorkflowRequest,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let client = ApiClient::new(&config, Arc::new(RejectLogin))?;
//! client.switch_tenant("tenant1-id").await;
//!
//! let request = WorkflowRequest::new(ArtifactType::System, "sys-123", ActionType::Link)
//!     .with_parameters("kc-456");
//! let gate = WorkflowGate::new(&client);
//! if gate.check(&request).await? == WorkflowCheck::Required {
//!     let created = gate.create(&request).await?;
//!     tracing::info!("{}", created.confirmation());
//! }
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod config;
mod error;
mod resources;
mod session;
mod types;
mod workflow;

pub use auth::{AuthState, LoginNavigator, LoginUrl, RejectLogin};
pub use client::{
    ApiClient, CSRF_HEADER, JSON_CONTENT_TYPE, MERGE_PATCH_CONTENT_TYPE, Page, QueryParams,
    QueryValue,
};
pub use config::{ClientConfig, ConsoleConfig, OBSERVABILITY_FILE, ObservabilityConfig};
pub use error::{
    AccessError, AccessErrorCode, ApiError, ConfigError, ErrorReport, GENERIC_ERROR_MESSAGE,
    HttpError, LoginError, WorkflowError,
};
pub use session::{CSRF_COOKIE_PREFIX, CookieJar, Session, TenantContext, csrf_cookie_name};
pub use types::{
    ActionType, ApprovalDecision, Approver, ArtifactType, Certificate, DefaultKeystore, Group,
    GroupRole, HyokCertificates, HyokKeystore, Key, KeyConfigMetadata, KeyConfiguration,
    KeyCreationType, KeyMetadata, KeyState, KeyUpdate, KeyVersion, KeystoreOptions,
    ListResponse, NewGroup, NewKeyConfiguration, NewManagedKey, RecoveryActions, System,
    SystemStatus, TaskState, TaskTransition, Tenant, Timestamps, UserInfo, WorkflowTask,
};
pub use workflow::{GateOutcome, WorkflowCheck, WorkflowCreated, WorkflowGate, WorkflowRequest};

use std::time::Duration;

/// Path segment every API route lives under.
pub const API_PREFIX: &str = "/cmk/v1";
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("cmk-client/", env!("CARGO_PKG_VERSION"));
