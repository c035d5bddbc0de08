//! Resource lifecycle orchestrator
//!
//! Front door for every mutation of file shares, snapshots, and access
//! rules. One generic create routine and one generic delete routine drive
//! all three resource types through the same sequence: validate, lock,
//! resolve the governing profile, check referential integrity, persist a
//! provisional record, dispatch to the backend, then settle the record
//! into its authoritative or failed state.

pub mod guard;
pub mod lifecycle;
pub mod locks;
pub mod profile;

pub use guard::IntegrityGuard;
pub use lifecycle::{AclLifecycle, ResourceLifecycle, ShareLifecycle, SnapshotLifecycle};
pub use locks::LockManager;
pub use profile::ProfileResolver;

use crate::catalog::{CatalogRef, ListFilter};
use crate::context::RequestContext;
use crate::dispatch::DispatcherRef;
use crate::error::{Error, Result};
use crate::model::{
    now_timestamp, FileShare, FileShareAcl, FileShareSnapshot, ResourceKind, ResourceStatus,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

// =============================================================================
// Configuration
// =============================================================================

/// What to do with a record whose backend delete failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteFailurePolicy {
    /// Keep the record in `errorDeleting` for operator intervention
    #[default]
    LeaveForOperator,
    /// Return the record to `available` so the caller may retry
    Revert,
}

/// Orchestrator tuning knobs
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    pub delete_failure_policy: DeleteFailurePolicy,
}

// =============================================================================
// Metadata Patch
// =============================================================================

/// Caller-editable fields for update operations. Everything else on a
/// record is owned by the control plane or the backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Coordinates catalog, profiles, locks, and backend dispatch for every
/// resource mutation
pub struct Orchestrator {
    catalog: CatalogRef,
    locks: LockManager,
    profiles: ProfileResolver,
    config: OrchestratorConfig,
    shares: ShareLifecycle,
    snapshots: SnapshotLifecycle,
    acls: AclLifecycle,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        catalog: CatalogRef,
        dispatcher: DispatcherRef,
    ) -> Arc<Self> {
        Arc::new(Self {
            shares: ShareLifecycle::new(catalog.clone(), dispatcher.clone()),
            snapshots: SnapshotLifecycle::new(catalog.clone(), dispatcher.clone()),
            acls: AclLifecycle::new(catalog.clone(), dispatcher),
            profiles: ProfileResolver::new(catalog.clone()),
            locks: LockManager::new(),
            catalog,
            config,
        })
    }

    // =========================================================================
    // Generic Lifecycle Routines
    // =========================================================================

    /// Create routine shared by all resource types.
    ///
    /// Validation and parent resolution run before any catalog write, so a
    /// rejected request leaves no trace. The provisional record is visible
    /// in `creating` while the backend works; dispatch failure settles it
    /// into `error` and surfaces the dispatch error to the caller.
    async fn create_resource<L: ResourceLifecycle>(
        &self,
        lifecycle: &L,
        ctx: &RequestContext,
        mut entity: L::Entity,
    ) -> Result<L::Entity> {
        lifecycle.prepare_create(ctx, &mut entity)?;
        let id = lifecycle.entity_id(&entity);

        // Parent lock first, entity lock second, always in that order.
        // Holding the parent share's lock keeps this create from racing
        // the parent's delete past its dependents check.
        let _parent_guard = match lifecycle.parent_share_id(&entity) {
            Some(share_id) => Some(self.locks.acquire(ResourceKind::FileShare, &share_id).await),
            None => None,
        };
        let _guard = self.locks.acquire(lifecycle.kind(), &id).await;

        let profile = self
            .profiles
            .resolve(ctx, lifecycle.entity_profile_id(&entity).as_deref())
            .await?;
        lifecycle.resolve_parent(ctx, &mut entity).await?;
        lifecycle.set_profile(&mut entity, &profile);

        let provisional = lifecycle.persist(ctx, entity).await?;
        info!(
            "Created provisional {} record: {}",
            lifecycle.kind(),
            id
        );

        match lifecycle.dispatch_create(ctx, &provisional, &profile).await {
            Ok(authoritative) => {
                let settled = lifecycle.update_record(ctx, authoritative).await?;
                info!("{} {} is now authoritative", lifecycle.kind(), id);
                Ok(settled)
            }
            Err(err) => {
                warn!(
                    "Backend create for {} {} failed: {}",
                    lifecycle.kind(),
                    id,
                    err
                );
                let mut failed = provisional;
                lifecycle.set_status(&mut failed, ResourceStatus::Error);
                if let Err(update_err) = lifecycle.update_record(ctx, failed).await {
                    warn!(
                        "Could not record failed state for {} {}: {}",
                        lifecycle.kind(),
                        id,
                        update_err
                    );
                }
                Err(err)
            }
        }
    }

    /// Delete routine shared by all resource types.
    ///
    /// The dependents check and the transition to `deleting` happen under
    /// the entity lock, so no dependent can slip in between. Dispatch
    /// failure applies the configured failure policy instead of removing
    /// the record.
    async fn delete_resource<L: ResourceLifecycle>(
        &self,
        lifecycle: &L,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<()> {
        let _guard = self.locks.acquire(lifecycle.kind(), id).await;

        let mut entity = lifecycle.fetch(ctx, id).await?;
        let profile = self
            .profiles
            .resolve(ctx, lifecycle.entity_profile_id(&entity).as_deref())
            .await?;

        let dependents = lifecycle.dependents(ctx, id).await?;
        if !dependents.is_empty() {
            return Err(Error::Conflict {
                kind: lifecycle.kind().as_str().into(),
                id: id.into(),
                reason: format!("dependents exist: {}", dependents.join(", ")),
            });
        }

        lifecycle.set_status(&mut entity, ResourceStatus::Deleting);
        let entity = lifecycle.update_record(ctx, entity).await?;

        match lifecycle.dispatch_delete(ctx, &entity, &profile).await {
            Ok(()) => {
                lifecycle.remove_record(ctx, id).await?;
                info!("Deleted {} {}", lifecycle.kind(), id);
                Ok(())
            }
            Err(err) => {
                warn!(
                    "Backend delete for {} {} failed: {}",
                    lifecycle.kind(),
                    id,
                    err
                );
                let mut failed = entity;
                let status = match self.config.delete_failure_policy {
                    DeleteFailurePolicy::LeaveForOperator => ResourceStatus::ErrorDeleting,
                    DeleteFailurePolicy::Revert => ResourceStatus::Available,
                };
                lifecycle.set_status(&mut failed, status);
                if let Err(update_err) = lifecycle.update_record(ctx, failed).await {
                    warn!(
                        "Could not record failed delete for {} {}: {}",
                        lifecycle.kind(),
                        id,
                        update_err
                    );
                }
                Err(err)
            }
        }
    }

    /// Point lookups collapse catalog failures into NotFound: a caller
    /// asking for one id learns only whether it is retrievable.
    fn lookup<T>(&self, kind: ResourceKind, id: &str, result: Result<T>) -> Result<T> {
        result.map_err(|err| match err {
            found @ Error::NotFound { .. } => found,
            other => {
                warn!("Catalog lookup for {}/{} failed: {}", kind, id, other);
                Error::not_found(kind.as_str(), id)
            }
        })
    }

    // =========================================================================
    // File Share Operations
    // =========================================================================

    pub async fn list_shares(
        &self,
        ctx: &RequestContext,
        filter: &ListFilter,
    ) -> Result<Vec<FileShare>> {
        self.catalog.list_shares(ctx, filter).await
    }

    pub async fn get_share(&self, ctx: &RequestContext, id: &str) -> Result<FileShare> {
        let result = self.catalog.get_share(ctx, id).await;
        self.lookup(ResourceKind::FileShare, id, result)
    }

    pub async fn create_share(&self, ctx: &RequestContext, share: FileShare) -> Result<FileShare> {
        self.create_resource(&self.shares, ctx, share).await
    }

    pub async fn update_share(
        &self,
        ctx: &RequestContext,
        id: &str,
        patch: MetadataPatch,
    ) -> Result<FileShare> {
        let _guard = self.locks.acquire(ResourceKind::FileShare, id).await;

        let mut share = self.catalog.get_share(ctx, id).await?;
        if let Some(name) = patch.name {
            share.name = name;
        }
        if let Some(description) = patch.description {
            share.description = description;
        }
        share.updated_at = now_timestamp();
        self.catalog.update_share(ctx, share).await
    }

    pub async fn delete_share(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        self.delete_resource(&self.shares, ctx, id).await
    }

    // =========================================================================
    // Snapshot Operations
    // =========================================================================

    pub async fn list_snapshots(
        &self,
        ctx: &RequestContext,
        filter: &ListFilter,
    ) -> Result<Vec<FileShareSnapshot>> {
        self.catalog.list_snapshots(ctx, filter).await
    }

    pub async fn get_snapshot(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<FileShareSnapshot> {
        let result = self.catalog.get_snapshot(ctx, id).await;
        self.lookup(ResourceKind::FileShareSnapshot, id, result)
    }

    pub async fn create_snapshot(
        &self,
        ctx: &RequestContext,
        snapshot: FileShareSnapshot,
    ) -> Result<FileShareSnapshot> {
        self.create_resource(&self.snapshots, ctx, snapshot).await
    }

    pub async fn update_snapshot(
        &self,
        ctx: &RequestContext,
        id: &str,
        patch: MetadataPatch,
    ) -> Result<FileShareSnapshot> {
        let _guard = self.locks.acquire(ResourceKind::FileShareSnapshot, id).await;

        let mut snapshot = self.catalog.get_snapshot(ctx, id).await?;
        if let Some(name) = patch.name {
            snapshot.name = name;
        }
        if let Some(description) = patch.description {
            snapshot.description = description;
        }
        snapshot.updated_at = now_timestamp();
        self.catalog.update_snapshot(ctx, snapshot).await
    }

    pub async fn delete_snapshot(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        self.delete_resource(&self.snapshots, ctx, id).await
    }

    // =========================================================================
    // ACL Operations
    // =========================================================================

    pub async fn list_acls(
        &self,
        ctx: &RequestContext,
        filter: &ListFilter,
    ) -> Result<Vec<FileShareAcl>> {
        self.catalog.list_acls(ctx, filter).await
    }

    pub async fn get_acl(&self, ctx: &RequestContext, id: &str) -> Result<FileShareAcl> {
        let result = self.catalog.get_acl(ctx, id).await;
        self.lookup(ResourceKind::FileShareAcl, id, result)
    }

    pub async fn create_acl(
        &self,
        ctx: &RequestContext,
        acl: FileShareAcl,
    ) -> Result<FileShareAcl> {
        self.create_resource(&self.acls, ctx, acl).await
    }

    pub async fn delete_acl(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        self.delete_resource(&self.acls, ctx, id).await
    }
}
