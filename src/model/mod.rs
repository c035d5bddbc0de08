//! Catalog resource model
//!
//! Entity shapes for the resources managed by the control plane: file
//! shares, their point-in-time snapshots, access-control entries, and the
//! storage profiles resolved at creation time. JSON field names are
//! camelCase to match the wire format of the catalog and driver.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed timestamp format carried on every record
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Current time in the catalog's fixed timestamp format
pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIME_FORMAT).to_string()
}

/// Fresh opaque identifier for a newly admitted resource
pub fn new_resource_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Resource Kind
// =============================================================================

/// Resource types managed by the lifecycle orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    FileShare,
    FileShareSnapshot,
    FileShareAcl,
    Profile,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::FileShare => "FileShare",
            ResourceKind::FileShareSnapshot => "FileShareSnapshot",
            ResourceKind::FileShareAcl => "FileShareAcl",
            ResourceKind::Profile => "Profile",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Resource Status
// =============================================================================

/// Lifecycle state of a catalog record
///
/// Transitions are monotonic within a single operation:
/// `creating -> available | error` and
/// `available -> deleting -> (removed) | errorDeleting`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceStatus {
    #[default]
    Creating,
    Available,
    Deleting,
    Error,
    ErrorDeleting,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Creating => write!(f, "creating"),
            ResourceStatus::Available => write!(f, "available"),
            ResourceStatus::Deleting => write!(f, "deleting"),
            ResourceStatus::Error => write!(f, "error"),
            ResourceStatus::ErrorDeleting => write!(f, "errorDeleting"),
        }
    }
}

// =============================================================================
// File Share
// =============================================================================

/// A provisioned network file-share resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileShare {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub tenant_id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    /// Capacity in GiB, must be positive
    pub size: i64,
    pub availability_zone: String,
    pub status: ResourceStatus,
    /// Placement target resolved by the backend
    pub pool_id: String,
    pub profile_id: String,
    /// Clone-from-snapshot source, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_name: Option<String>,
    /// Network endpoints populated by the backend driver
    pub export_locations: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

// =============================================================================
// File Share Snapshot
// =============================================================================

/// A point-in-time, read-only copy of a share's data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileShareSnapshot {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub tenant_id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    /// Owning share; required and never reassigned after creation
    pub fileshare_id: String,
    pub profile_id: String,
    pub share_size: i64,
    pub snapshot_size: i64,
    pub status: ResourceStatus,
}

// =============================================================================
// File Share ACL
// =============================================================================

/// An access-control entry granting a subject capabilities on a share
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileShareAcl {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub tenant_id: String,
    pub user_id: String,
    /// Owning share; required at creation time
    pub fileshare_id: String,
    /// Subject discriminator, e.g. "ip"
    #[serde(rename = "type")]
    pub access_type: String,
    /// Granted capabilities, e.g. ["Read", "Write"]
    pub access_capability: Vec<String>,
    /// Subject identifier, e.g. an address or group
    pub access_to: String,
    pub profile_id: String,
    pub description: String,
    pub status: ResourceStatus,
    pub metadata: BTreeMap<String, String>,
}

// =============================================================================
// Profile
// =============================================================================

/// A named storage policy bundle, resolved at creation time and forwarded
/// to the backend driver with every dispatch. Never mutated by this core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub description: String,
    pub storage_type: String,
    pub custom_properties: BTreeMap<String, serde_json::Value>,
}

impl Profile {
    /// Serialized form forwarded to the backend driver
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&ResourceStatus::ErrorDeleting).unwrap(),
            "\"errorDeleting\""
        );
        assert_eq!(
            serde_json::to_string(&ResourceStatus::Creating).unwrap(),
            "\"creating\""
        );
        let status: ResourceStatus = serde_json::from_str("\"available\"").unwrap();
        assert_eq!(status, ResourceStatus::Available);
    }

    #[test]
    fn test_share_decodes_partial_payload() {
        let payload = r#"{
            "id": "d2975ebe-d82c-430f-b28e-f373746a71ca",
            "name": "sample-fileshare-01",
            "description": "This is first sample fileshare for testing",
            "size": 1,
            "poolId": "a5965ebe-dg2c-434t-b28e-f373746a71ca",
            "snapshotId": "b7602e18-771e-11e7-8f38-dbd6d291f4eg"
        }"#;

        let share: FileShare = serde_json::from_str(payload).unwrap();
        assert_eq!(share.id, "d2975ebe-d82c-430f-b28e-f373746a71ca");
        assert_eq!(share.size, 1);
        assert_eq!(share.pool_id, "a5965ebe-dg2c-434t-b28e-f373746a71ca");
        assert_eq!(
            share.snapshot_id.as_deref(),
            Some("b7602e18-771e-11e7-8f38-dbd6d291f4eg")
        );
        assert_eq!(share.status, ResourceStatus::Creating);
        assert!(share.export_locations.is_empty());
    }

    #[test]
    fn test_acl_type_field_name() {
        let payload = r#"{
            "fileshareId": "d2975ebe-d82c-430f-b28e-f373746a71ca",
            "type": "ip",
            "accessCapability": ["Read", "Write"],
            "accessTo": "10.32.109.15"
        }"#;

        let acl: FileShareAcl = serde_json::from_str(payload).unwrap();
        assert_eq!(acl.access_type, "ip");
        assert_eq!(acl.access_capability, vec!["Read", "Write"]);

        let json = serde_json::to_string(&acl).unwrap();
        assert!(json.contains("\"type\":\"ip\""));
    }

    #[test]
    fn test_timestamp_format() {
        let ts = now_timestamp();
        // 2017-10-24T16:21:32 shape
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
    }

    #[test]
    fn test_new_resource_id_is_uuid() {
        let id = new_resource_id();
        assert_eq!(id.len(), 36);
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }
}
