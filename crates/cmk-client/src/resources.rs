//! Typed wrappers for the CMK endpoints.
//!
//! Each method is a thin layer over the generic verbs and keeps their
//! contract: `Ok(None)` means the call produced no body (or the session is
//! being re-established), errors are the client's [`ApiError`]s.
//!
//! Mutations that return no resource answer `Ok(Some(()))` when the backend
//! accepted the change, even with an empty body. `Ok(None)` from them means
//! a 401 started the login redirect and nothing was changed.

use reqwest::Method;
use serde_json::{Value, json};
use tracing::error;

use crate::client::{ApiClient, Page, QueryParams};
use crate::error::ApiError;
use crate::types::{
    Approver, Group, HyokCertificates, Key, KeyConfiguration, KeyUpdate, KeyVersion,
    KeystoreOptions, ListResponse, NewGroup, NewKeyConfiguration, NewManagedKey,
    RecoveryActions, System, TaskTransition, Tenant, UserInfo, WorkflowTask,
};

/// Page size used for tenant discovery.
const TENANT_PAGE: Page = Page::new(1024, 0);

fn enc(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

impl ApiClient {
    // --- Tenants ---

    /// List the tenants the user can access and cache them in the session.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn list_tenants(&self) -> Result<Option<ListResponse<Tenant>>, ApiError> {
        let resp = self
            .get::<ListResponse<Tenant>>("tenants", &QueryParams::new().page(TENANT_PAGE))
            .await
            .inspect_err(|e| error!(error = %e, "error fetching tenants"))?;
        if let Some(list) = &resp {
            self.cache_tenants(list.value.clone()).await;
        }
        Ok(resp)
    }

    /// List all tenants from the system-level endpoint (`sys/tenants`,
    /// resolved against the API root when no tenant is selected).
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn list_system_tenants(&self) -> Result<Option<ListResponse<Tenant>>, ApiError> {
        self.get("sys/tenants", &QueryParams::new()).await
    }

    /// Key provisioning modes the tenant allows.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn keystore_options(&self) -> Result<Option<KeystoreOptions>, ApiError> {
        self.get("tenants/keystores", &QueryParams::new()).await
    }

    /// Look up a user and remember them as the signed-in user.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn load_user(&self, user_id: &str) -> Result<Option<UserInfo>, ApiError> {
        let user: Option<UserInfo> = self
            .get(&format!("user/{}", enc(user_id)), &QueryParams::new())
            .await?;
        if let Some(user) = &user {
            self.set_user_info(user.clone()).await;
        }
        Ok(user)
    }

    // --- Key configurations ---

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn list_key_configurations(
        &self,
        page: Page,
        expand_group: bool,
    ) -> Result<Option<ListResponse<KeyConfiguration>>, ApiError> {
        let mut params = QueryParams::new().page(page);
        if expand_group {
            params = params.with("expandGroup", true);
        }
        self.get("keyConfigurations", &params).await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn get_key_configuration(
        &self,
        id: &str,
    ) -> Result<Option<KeyConfiguration>, ApiError> {
        self.get(&format!("keyConfigurations/{}", enc(id)), &QueryParams::new())
            .await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn create_key_configuration(
        &self,
        new: &NewKeyConfiguration,
    ) -> Result<Option<KeyConfiguration>, ApiError> {
        self.post("keyConfigurations", new).await
    }

    /// Merge-patch a key configuration (name, description, …).
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn update_key_configuration(
        &self,
        id: &str,
        patch: &Value,
    ) -> Result<Option<KeyConfiguration>, ApiError> {
        self.patch(&format!("keyConfigurations/{}", enc(id)), patch)
            .await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn delete_key_configuration(&self, id: &str) -> Result<Option<()>, ApiError> {
        self.mutate::<Value>(Method::DELETE, &format!("keyConfigurations/{}", enc(id)), None)
            .await
    }

    /// Tags attached to a key configuration.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn get_tags(&self, id: &str) -> Result<Option<Vec<String>>, ApiError> {
        let resp: Option<ListResponse<String>> = self
            .get(&format!("keyConfigurations/{}/tags", enc(id)), &QueryParams::new())
            .await?;
        Ok(resp.map(|list| list.value))
    }

    /// Replace the tags of a key configuration.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn put_tags(&self, id: &str, tags: &[String]) -> Result<Option<()>, ApiError> {
        self.mutate(
            Method::PUT,
            &format!("keyConfigurations/{}/tags", enc(id)),
            Some(&json!({ "tags": tags })),
        )
        .await
    }

    /// Make `key_id` the primary key of a key configuration.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn set_primary_key(
        &self,
        key_config_id: &str,
        key_id: &str,
    ) -> Result<Option<()>, ApiError> {
        self.mutate(
            Method::PUT,
            &format!("keyConfig/{}/primaryKey", enc(key_config_id)),
            Some(&json!({ "keyID": key_id })),
        )
        .await
    }

    /// Certificates required to set up a HYOK key.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn hyok_certificates(
        &self,
        key_config_id: &str,
    ) -> Result<Option<HyokCertificates>, ApiError> {
        self.get(
            &format!("keyConfigurations/{}/certificates", enc(key_config_id)),
            &QueryParams::new(),
        )
        .await
    }

    // --- Keys ---

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn list_keys(
        &self,
        key_config_id: &str,
        page: Page,
    ) -> Result<Option<ListResponse<Key>>, ApiError> {
        let params = QueryParams::new()
            .page(page)
            .with("keyConfigurationID", key_config_id);
        self.get("keys", &params).await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn get_key(&self, id: &str) -> Result<Option<Key>, ApiError> {
        self.get(&format!("keys/{}", enc(id)), &QueryParams::new())
            .await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn create_managed_key(&self, new: &NewManagedKey) -> Result<Option<Key>, ApiError> {
        self.post("keys", new).await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn update_key(&self, id: &str, update: &KeyUpdate) -> Result<Option<Key>, ApiError> {
        self.patch(&format!("keys/{}", enc(id)), update).await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn delete_key(&self, id: &str) -> Result<Option<()>, ApiError> {
        self.mutate::<Value>(Method::DELETE, &format!("keys/{}", enc(id)), None)
            .await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn list_key_versions(
        &self,
        key_id: &str,
    ) -> Result<Option<ListResponse<KeyVersion>>, ApiError> {
        self.get(&format!("keys/{}/versions", enc(key_id)), &QueryParams::new())
            .await
    }

    /// Create a new version of a key (rotation).
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn rotate_key(&self, key_id: &str) -> Result<Option<()>, ApiError> {
        self.mutate(
            Method::POST,
            &format!("keys/{}/versions", enc(key_id)),
            Some(&json!({})),
        )
        .await
    }

    /// Wrapping parameters for importing BYOK material.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn key_import_params(&self, key_id: &str) -> Result<Option<Value>, ApiError> {
        self.get(&format!("keys/{}/importParams", enc(key_id)), &QueryParams::new())
            .await
    }

    // --- Systems ---

    /// List systems, optionally only those linked to a key configuration.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn list_systems(
        &self,
        page: Page,
        key_config_id: Option<&str>,
    ) -> Result<Option<ListResponse<System>>, ApiError> {
        let mut params = QueryParams::new().page(page);
        if let Some(id) = key_config_id {
            params = params.with("keyConfigurationID", id);
        }
        self.get("systems", &params).await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn get_system(&self, id: &str) -> Result<Option<System>, ApiError> {
        self.get(&format!("systems/{}", enc(id)), &QueryParams::new())
            .await
    }

    /// Link a system to a key configuration. Callers gate this through
    /// [`WorkflowGate`](crate::WorkflowGate) first.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn link_system(
        &self,
        system_id: &str,
        key_config_id: &str,
    ) -> Result<Option<()>, ApiError> {
        self.mutate(
            Method::PATCH,
            &format!("systems/{}/link", enc(system_id)),
            Some(&json!({ "keyConfigurationID": key_config_id })),
        )
        .await
    }

    /// Disconnect a system from its key configuration.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn unlink_system(&self, system_id: &str) -> Result<Option<()>, ApiError> {
        self.mutate::<Value>(Method::DELETE, &format!("systems/{}/link", enc(system_id)), None)
            .await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn system_recovery_actions(
        &self,
        system_id: &str,
    ) -> Result<Option<RecoveryActions>, ApiError> {
        self.get(
            &format!("systems/{}/recoveryActions", enc(system_id)),
            &QueryParams::new(),
        )
        .await
    }

    /// Run a recovery action (`CANCEL` or `RETRY`) on a failed system.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn recover_system(
        &self,
        system_id: &str,
        action: &str,
    ) -> Result<Option<()>, ApiError> {
        self.mutate(
            Method::POST,
            &format!("systems/{}/recoveryActions", enc(system_id)),
            Some(&json!({ "action": action })),
        )
        .await
    }

    // --- Groups ---

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn list_groups(&self, page: Page) -> Result<Option<ListResponse<Group>>, ApiError> {
        self.get("groups", &QueryParams::new().page(page)).await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn get_group(&self, id: &str) -> Result<Option<Group>, ApiError> {
        self.get(&format!("groups/{}", enc(id)), &QueryParams::new())
            .await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn create_group(&self, new: &NewGroup) -> Result<Option<Group>, ApiError> {
        self.post("groups", new).await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn delete_group(&self, id: &str) -> Result<Option<()>, ApiError> {
        self.mutate::<Value>(Method::DELETE, &format!("groups/{}", enc(id)), None)
            .await
    }

    // --- Workflows (tasks) ---

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn list_workflows(
        &self,
        page: Page,
    ) -> Result<Option<ListResponse<WorkflowTask>>, ApiError> {
        self.get("workflows", &QueryParams::new().page(page)).await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn get_workflow(&self, task_id: &str) -> Result<Option<WorkflowTask>, ApiError> {
        self.get(&format!("workflows/{}", enc(task_id)), &QueryParams::new())
            .await
    }

    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn list_approvers(
        &self,
        task_id: &str,
    ) -> Result<Option<ListResponse<Approver>>, ApiError> {
        self.get(
            &format!("workflows/{}/approvers", enc(task_id)),
            &QueryParams::new(),
        )
        .await
    }

    /// Approve, reject, confirm, or revoke a task.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn transition_workflow(
        &self,
        task_id: &str,
        transition: TaskTransition,
    ) -> Result<Option<()>, ApiError> {
        self.mutate(
            Method::POST,
            &format!("workflows/{}/state", enc(task_id)),
            Some(&json!({ "transition": transition })),
        )
        .await
    }
}
