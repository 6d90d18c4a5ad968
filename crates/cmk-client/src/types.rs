//! Wire types for the CMK API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope every list endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub count: u64,
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self {
            value: Vec::new(),
            count: 0,
        }
    }
}

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyState {
    Enabled,
    Disabled,
    PendingDeletion,
    PendingImport,
    Deleted,
    #[default]
    #[serde(other)]
    Unknown,
}

/// How key material is provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyCreationType {
    #[default]
    SystemManaged,
    /// Hold your own key: material stays in the customer's cloud account.
    Hyok,
    /// Bring your own key: customer-supplied material is imported.
    Byok,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemStatus {
    Connected,
    #[default]
    Disconnected,
    Processing,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupRole {
    #[default]
    KeyAdministrator,
    TenantAdministrator,
    TenantAuditor,
    #[serde(other)]
    Unknown,
}

/// Lifecycle of an approval task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    #[default]
    Initial,
    Revoked,
    Rejected,
    Expired,
    WaitApproval,
    WaitConfirmation,
    Executing,
    Successful,
    Failed,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// No further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Revoked | Self::Rejected | Self::Expired | Self::Successful | Self::Failed
        )
    }
}

/// Transition a user can request on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskTransition {
    Approve,
    Reject,
    Confirm,
    Revoke,
}

impl TaskTransition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
            Self::Confirm => "CONFIRM",
            Self::Revoke => "REVOKE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
    #[default]
    Pending,
    Confirmed,
    #[serde(other)]
    Unknown,
}

/// Kind of artifact a workflow acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactType {
    Key,
    KeyConfiguration,
    System,
}

/// Action a workflow requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    UpdateState,
    UpdatePrimaryKey,
    Link,
    Unlink,
    Switch,
    Delete,
}

// --- Tenants and users ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<GroupRole>,
}

// --- Key configurations ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyConfigMetadata {
    #[serde(default, rename = "creatorID")]
    pub creator_id: String,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub total_keys: u64,
    #[serde(default)]
    pub total_systems: u64,
}

/// A named group of keys with one primary key and an administrating group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyConfiguration {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "adminGroupID")]
    pub admin_group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_group: Option<Group>,
    #[serde(default)]
    pub can_connect_systems: bool,
    #[serde(default)]
    pub metadata: Option<KeyConfigMetadata>,
    #[serde(default, rename = "primaryKeyID", skip_serializing_if = "Option::is_none")]
    pub primary_key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewKeyConfiguration {
    pub name: String,
    pub description: String,
    #[serde(rename = "adminGroupID")]
    pub admin_group_id: String,
}

// --- Keys ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetadata {
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_by: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub imported: bool,
    #[serde(default)]
    pub total_versions: u32,
    #[serde(default)]
    pub primary_version: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub state: KeyState,
    #[serde(default)]
    pub customer_held: bool,
    #[serde(default)]
    pub native_id: String,
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, rename = "type")]
    pub key_type: KeyCreationType,
    #[serde(default)]
    pub metadata: Option<KeyMetadata>,
}

/// Body for creating a system-managed key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewManagedKey {
    pub name: String,
    #[serde(rename = "keyConfigurationID")]
    pub key_configuration_id: String,
    #[serde(rename = "type")]
    pub key_type: KeyCreationType,
    pub description: String,
    pub algorithm: String,
    pub region: String,
    pub enabled: bool,
}

/// Merge-patch body for a key; unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVersion {
    pub version: u32,
    #[serde(default)]
    pub state: KeyState,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub metadata: Option<Timestamps>,
}

// --- Systems ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct System {
    pub id: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, rename = "type")]
    pub system_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(default)]
    pub status: SystemStatus,
    #[serde(default)]
    pub key_configuration_name: String,
    #[serde(default, rename = "keyConfigurationID")]
    pub key_configuration_id: String,
}

/// Recovery options for a system stuck in a failed link operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryActions {
    #[serde(default)]
    pub can_cancel: bool,
    #[serde(default)]
    pub can_retry: bool,
}

// --- Groups ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub iam_identifier: String,
    #[serde(default)]
    pub role: GroupRole,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub name: String,
    pub description: String,
    pub role: GroupRole,
}

// --- Workflows ---

/// A backend approval task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTask {
    pub id: String,
    #[serde(default, rename = "initiatorID")]
    pub initiator_id: String,
    #[serde(default)]
    pub initiator_name: String,
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub action_type: Option<ActionType>,
    #[serde(default)]
    pub artifact_type: Option<ArtifactType>,
    #[serde(default, rename = "artifactID")]
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub available_transitions: Vec<TaskTransition>,
    #[serde(default)]
    pub metadata: Option<Timestamps>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approver {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub decision: ApprovalDecision,
}

// --- Tenant configuration ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultKeystore {
    #[serde(default)]
    pub allow_managed: bool,
    #[serde(default, rename = "allowBYOK")]
    pub allow_byok: bool,
    #[serde(default)]
    pub supported_regions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyokKeystore {
    #[serde(default)]
    pub allow: bool,
    #[serde(default)]
    pub providers: Vec<String>,
}

/// Key provisioning modes the tenant allows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeystoreOptions {
    #[serde(default)]
    pub default: DefaultKeystore,
    #[serde(default)]
    pub hyok: HyokKeystore,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub name: String,
    #[serde(default, rename = "rootCA")]
    pub root_ca: String,
    #[serde(default)]
    pub subject: String,
}

/// Certificates a HYOK key needs: the tenant's management certificates and
/// the per-role crypto certificates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HyokCertificates {
    #[serde(default)]
    pub tenant_default: ListResponse<Certificate>,
    #[serde(default)]
    pub crypto: ListResponse<Certificate>,
}
