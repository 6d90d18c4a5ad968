//! Approval gating for sensitive mutations.
//!
//! Some actions (linking a system to a key configuration, disconnecting it,
//! switching primary keys, …) may require approval by other administrators.
//! Before running such an action the caller asks the backend whether an
//! approval workflow is required. The gate fails closed: if the check cannot
//! be completed the mutation must not run.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::client::ApiClient;
use crate::error::{ApiError, WorkflowError};
use crate::types::{ActionType, ArtifactType};

/// What a caller wants to do to which artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRequest {
    pub artifact_type: ArtifactType,
    #[serde(rename = "artifactID")]
    pub artifact_id: String,
    pub action_type: ActionType,
    /// Action argument, e.g. the target key configuration of a `LINK`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
}

impl WorkflowRequest {
    #[must_use]
    pub fn new(artifact_type: ArtifactType, artifact_id: &str, action_type: ActionType) -> Self {
        Self {
            artifact_type,
            artifact_id: artifact_id.to_owned(),
            action_type,
            parameters: None,
        }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: &str) -> Self {
        self.parameters = Some(parameters.to_owned());
        self
    }
}

/// Outcome of a successful workflow check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowCheck {
    /// Run the mutation directly.
    NotRequired,
    /// Submit an approval request instead of running the mutation.
    Required,
    /// An approval request for this action is already pending; it must be
    /// resolved first.
    AlreadyExists,
}

/// Result of [`WorkflowGate::run_gated`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome<T> {
    /// No approval needed; the mutation ran and returned this value.
    Executed(T),
    /// The mutation did not run; an approval request is needed.
    ApprovalRequired,
    /// The mutation did not run; an approval request is already pending.
    AlreadyPending,
}

/// A workflow persisted by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorkflowCreated {
    #[serde(default)]
    pub id: Option<String>,
}

impl WorkflowCreated {
    /// Confirmation message for the user.
    #[must_use]
    pub fn confirmation(&self) -> String {
        format!(
            "Workflow {} created and sent for approval.",
            self.id.as_deref().unwrap_or_default()
        )
    }
}

/// Both flags must be present; a body missing either is a decode error.
#[derive(Deserialize)]
struct CheckResponse {
    required: bool,
    exists: bool,
}

/// Asks the backend whether actions need approval and files approval
/// requests.
#[derive(Clone, Copy)]
pub struct WorkflowGate<'a> {
    client: &'a ApiClient,
}

impl<'a> WorkflowGate<'a> {
    #[must_use]
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Check whether `request` needs approval.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoResponse`] when the check produced no body
    /// and [`WorkflowError::Api`] for any request failure. In both cases the
    /// mutation must not run.
    pub async fn check(&self, request: &WorkflowRequest) -> Result<WorkflowCheck, WorkflowError> {
        let resp: Option<CheckResponse> = self
            .client
            .post("workflows/check", request)
            .await
            .inspect_err(|e| error!(error = %e, "error checking workflow requirement"))?;

        let Some(resp) = resp else {
            error!("no response from workflow check");
            return Err(WorkflowError::NoResponse);
        };

        if resp.exists {
            error!(
                artifact_id = %request.artifact_id,
                action = ?request.action_type,
                "workflow already exists"
            );
            return Ok(WorkflowCheck::AlreadyExists);
        }
        if resp.required {
            Ok(WorkflowCheck::Required)
        } else {
            Ok(WorkflowCheck::NotRequired)
        }
    }

    /// File an approval request. Never retried.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Api`] if the backend rejects the request and
    /// [`WorkflowError::NoResponse`] if nothing was persisted (empty body or
    /// a 401 absorbed by the login redirect).
    pub async fn create(&self, request: &WorkflowRequest) -> Result<WorkflowCreated, WorkflowError> {
        let created: Option<WorkflowCreated> = self
            .client
            .post("workflows", request)
            .await
            .inspect_err(|e| error!(error = %e, "error creating workflow"))?;
        let Some(created) = created.filter(|c| c.id.is_some()) else {
            error!("workflow creation returned no workflow");
            return Err(WorkflowError::NoResponse);
        };
        info!(id = created.id.as_deref().unwrap_or_default(), "workflow created");
        Ok(created)
    }

    /// Run `direct` only if the backend says no approval is required.
    ///
    /// # Errors
    ///
    /// Returns the check's error, or the mutation's error wrapped in
    /// [`WorkflowError::Api`].
    pub async fn run_gated<T, F, Fut>(
        &self,
        request: &WorkflowRequest,
        direct: F,
    ) -> Result<GateOutcome<T>, WorkflowError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match self.check(request).await? {
            WorkflowCheck::NotRequired => Ok(GateOutcome::Executed(direct().await?)),
            WorkflowCheck::Required => Ok(GateOutcome::ApprovalRequired),
            WorkflowCheck::AlreadyExists => Ok(GateOutcome::AlreadyPending),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_backend_field_names() {
        let req = WorkflowRequest::new(ArtifactType::System, "sys-123", ActionType::Link)
            .with_parameters("kc-456");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "artifactType": "SYSTEM",
                "artifactID": "sys-123",
                "actionType": "LINK",
                "parameters": "kc-456"
            })
        );
    }

    #[test]
    fn request_without_parameters_omits_field() {
        let req = WorkflowRequest::new(
            ArtifactType::KeyConfiguration,
            "kc-1",
            ActionType::UpdatePrimaryKey,
        );
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["actionType"], "UPDATE_PRIMARY_KEY");
        assert_eq!(value["artifactType"], "KEY_CONFIGURATION");
        assert!(value.get("parameters").is_none());
    }

    #[test]
    fn confirmation_references_server_id() {
        let created = WorkflowCreated {
            id: Some("wf-1".into()),
        };
        assert!(created.confirmation().contains("wf-1"));
    }
}
