//! Backend dispatcher port
//!
//! The dispatcher issues provisioning/de-provisioning calls to the backend
//! driver, passing the resolved entity (or its identifying subset for
//! deletes), the resolved profile, and the caller's serialized security
//! context. The call is blocking from the orchestrator's viewpoint; retry
//! policy and connection management belong to the adapter. The orchestrator
//! never issues a second create/delete for the same id while one is
//! outstanding.

pub mod http;
pub mod loopback;

pub use http::{HttpDriverConfig, HttpDriverDispatcher};
pub use loopback::{LoopbackConfig, LoopbackDispatcher};

use crate::context::RequestContext;
use crate::error::Result;
use crate::model::{FileShare, FileShareAcl, FileShareSnapshot, Profile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// Wire Opts
// =============================================================================

/// Create-share call sent to the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareOpts {
    pub id: String,
    pub name: String,
    pub description: String,
    pub size: i64,
    pub availability_zone: String,
    pub pool_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_name: Option<String>,
    /// Resolved profile, serialized
    pub profile: String,
    /// Caller security context, serialized
    pub context: String,
}

/// Delete-share call sent to the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteShareOpts {
    pub id: String,
    pub pool_id: String,
    pub export_locations: Vec<String>,
    pub profile: String,
    pub context: String,
    pub metadata: BTreeMap<String, String>,
}

/// Create-snapshot call sent to the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnapshotOpts {
    pub id: String,
    pub name: String,
    pub description: String,
    pub fileshare_id: String,
    pub size: i64,
    pub profile: String,
    pub context: String,
}

/// Delete-snapshot call sent to the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSnapshotOpts {
    pub id: String,
    pub fileshare_id: String,
    pub profile: String,
    pub context: String,
}

/// Create-ACL call sent to the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAclOpts {
    pub id: String,
    pub fileshare_id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub access_type: String,
    pub access_capability: Vec<String>,
    pub access_to: String,
    pub profile: String,
    pub context: String,
}

/// Delete-ACL call sent to the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAclOpts {
    pub id: String,
    pub fileshare_id: String,
    #[serde(rename = "type")]
    pub access_type: String,
    pub access_capability: Vec<String>,
    pub access_to: String,
    pub profile: String,
    pub context: String,
    pub metadata: BTreeMap<String, String>,
}

impl CreateShareOpts {
    pub fn build(ctx: &RequestContext, share: &FileShare, profile: &Profile) -> Result<Self> {
        Ok(Self {
            id: share.id.clone(),
            name: share.name.clone(),
            description: share.description.clone(),
            size: share.size,
            availability_zone: share.availability_zone.clone(),
            pool_id: share.pool_id.clone(),
            snapshot_id: share.snapshot_id.clone(),
            snapshot_name: share.snapshot_name.clone(),
            profile: profile.to_json()?,
            context: ctx.to_json()?,
        })
    }
}

impl DeleteShareOpts {
    pub fn build(ctx: &RequestContext, share: &FileShare, profile: &Profile) -> Result<Self> {
        Ok(Self {
            id: share.id.clone(),
            pool_id: share.pool_id.clone(),
            export_locations: share.export_locations.clone(),
            profile: profile.to_json()?,
            context: ctx.to_json()?,
            metadata: share.metadata.clone(),
        })
    }
}

impl CreateSnapshotOpts {
    pub fn build(
        ctx: &RequestContext,
        snapshot: &FileShareSnapshot,
        profile: &Profile,
    ) -> Result<Self> {
        Ok(Self {
            id: snapshot.id.clone(),
            name: snapshot.name.clone(),
            description: snapshot.description.clone(),
            fileshare_id: snapshot.fileshare_id.clone(),
            size: snapshot.snapshot_size,
            profile: profile.to_json()?,
            context: ctx.to_json()?,
        })
    }
}

impl DeleteSnapshotOpts {
    pub fn build(
        ctx: &RequestContext,
        snapshot: &FileShareSnapshot,
        profile: &Profile,
    ) -> Result<Self> {
        Ok(Self {
            id: snapshot.id.clone(),
            fileshare_id: snapshot.fileshare_id.clone(),
            profile: profile.to_json()?,
            context: ctx.to_json()?,
        })
    }
}

impl CreateAclOpts {
    pub fn build(ctx: &RequestContext, acl: &FileShareAcl, profile: &Profile) -> Result<Self> {
        Ok(Self {
            id: acl.id.clone(),
            fileshare_id: acl.fileshare_id.clone(),
            description: acl.description.clone(),
            access_type: acl.access_type.clone(),
            access_capability: acl.access_capability.clone(),
            access_to: acl.access_to.clone(),
            profile: profile.to_json()?,
            context: ctx.to_json()?,
        })
    }
}

impl DeleteAclOpts {
    pub fn build(ctx: &RequestContext, acl: &FileShareAcl, profile: &Profile) -> Result<Self> {
        Ok(Self {
            id: acl.id.clone(),
            fileshare_id: acl.fileshare_id.clone(),
            access_type: acl.access_type.clone(),
            access_capability: acl.access_capability.clone(),
            access_to: acl.access_to.clone(),
            profile: profile.to_json()?,
            context: ctx.to_json()?,
            metadata: acl.metadata.clone(),
        })
    }
}

// =============================================================================
// Dispatcher Port
// =============================================================================

/// Port for backend provisioning/de-provisioning calls
///
/// Create operations return the backend's authoritative representation
/// (e.g. populated export locations); delete operations acknowledge removal.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn create_share(
        &self,
        ctx: &RequestContext,
        share: &FileShare,
        profile: &Profile,
    ) -> Result<FileShare>;

    async fn delete_share(
        &self,
        ctx: &RequestContext,
        share: &FileShare,
        profile: &Profile,
    ) -> Result<()>;

    async fn create_snapshot(
        &self,
        ctx: &RequestContext,
        snapshot: &FileShareSnapshot,
        profile: &Profile,
    ) -> Result<FileShareSnapshot>;

    async fn delete_snapshot(
        &self,
        ctx: &RequestContext,
        snapshot: &FileShareSnapshot,
        profile: &Profile,
    ) -> Result<()>;

    async fn create_acl(
        &self,
        ctx: &RequestContext,
        acl: &FileShareAcl,
        profile: &Profile,
    ) -> Result<FileShareAcl>;

    async fn delete_acl(
        &self,
        ctx: &RequestContext,
        acl: &FileShareAcl,
        profile: &Profile,
    ) -> Result<()>;
}

pub type DispatcherRef = Arc<dyn Dispatcher>;
