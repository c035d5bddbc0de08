//! Per-resource lifecycle capabilities
//!
//! Share, snapshot, and ACL lifecycles share one create/delete skeleton.
//! The skeleton lives in the orchestrator; this trait captures what varies
//! per resource type: payload validation, parent resolution, catalog
//! persistence, backend dispatch, and the dependents check.

use crate::catalog::CatalogRef;
use crate::context::RequestContext;
use crate::dispatch::DispatcherRef;
use crate::error::{Error, Result};
use crate::model::{
    now_timestamp, new_resource_id, FileShare, FileShareAcl, FileShareSnapshot, Profile,
    ResourceKind, ResourceStatus,
};
use crate::orchestrator::guard::IntegrityGuard;
use async_trait::async_trait;

/// Capability interface the generic lifecycle routine is parameterized over
#[async_trait]
pub trait ResourceLifecycle: Send + Sync {
    type Entity: Clone + Send + Sync + 'static;

    fn kind(&self) -> ResourceKind;

    fn entity_id(&self, entity: &Self::Entity) -> String;

    fn entity_profile_id(&self, entity: &Self::Entity) -> Option<String>;

    fn set_profile(&self, entity: &mut Self::Entity, profile: &Profile);

    fn set_status(&self, entity: &mut Self::Entity, status: ResourceStatus);

    /// Share whose advisory lock must be held while creating this entity,
    /// so a dependent cannot appear between a delete's guard check and its
    /// completion.
    fn parent_share_id(&self, entity: &Self::Entity) -> Option<String>;

    /// Normalize and validate an inbound create payload: reject malformed
    /// input, assign identifier and timestamps, stamp ownership from the
    /// caller's context. Runs before any catalog access.
    fn prepare_create(&self, ctx: &RequestContext, entity: &mut Self::Entity) -> Result<()>;

    /// Resolve referenced parents. Must run before any catalog write; a
    /// missing parent fails with NotFound.
    async fn resolve_parent(&self, ctx: &RequestContext, entity: &mut Self::Entity) -> Result<()>;

    async fn fetch(&self, ctx: &RequestContext, id: &str) -> Result<Self::Entity>;

    async fn persist(&self, ctx: &RequestContext, entity: Self::Entity) -> Result<Self::Entity>;

    async fn update_record(
        &self,
        ctx: &RequestContext,
        entity: Self::Entity,
    ) -> Result<Self::Entity>;

    async fn remove_record(&self, ctx: &RequestContext, id: &str) -> Result<()>;

    async fn dispatch_create(
        &self,
        ctx: &RequestContext,
        entity: &Self::Entity,
        profile: &Profile,
    ) -> Result<Self::Entity>;

    async fn dispatch_delete(
        &self,
        ctx: &RequestContext,
        entity: &Self::Entity,
        profile: &Profile,
    ) -> Result<()>;

    /// Dependents blocking deletion; non-empty blocks with Conflict.
    async fn dependents(&self, ctx: &RequestContext, id: &str) -> Result<Vec<String>>;
}

fn stamp_ownership(
    ctx: &RequestContext,
    id: &mut String,
    created_at: &mut String,
    updated_at: &mut String,
    tenant_id: &mut String,
    user_id: &mut String,
) {
    if id.is_empty() {
        *id = new_resource_id();
    }
    let now = now_timestamp();
    *created_at = now.clone();
    *updated_at = now;
    *tenant_id = ctx.tenant_id.clone();
    *user_id = ctx.user_id.clone();
}

// =============================================================================
// File Share Lifecycle
// =============================================================================

pub struct ShareLifecycle {
    catalog: CatalogRef,
    dispatcher: DispatcherRef,
    guard: IntegrityGuard,
}

impl ShareLifecycle {
    pub fn new(catalog: CatalogRef, dispatcher: DispatcherRef) -> Self {
        let guard = IntegrityGuard::new(catalog.clone());
        Self {
            catalog,
            dispatcher,
            guard,
        }
    }
}

#[async_trait]
impl ResourceLifecycle for ShareLifecycle {
    type Entity = FileShare;

    fn kind(&self) -> ResourceKind {
        ResourceKind::FileShare
    }

    fn entity_id(&self, entity: &FileShare) -> String {
        entity.id.clone()
    }

    fn entity_profile_id(&self, entity: &FileShare) -> Option<String> {
        if entity.profile_id.is_empty() {
            None
        } else {
            Some(entity.profile_id.clone())
        }
    }

    fn set_profile(&self, entity: &mut FileShare, profile: &Profile) {
        entity.profile_id = profile.id.clone();
    }

    fn set_status(&self, entity: &mut FileShare, status: ResourceStatus) {
        entity.status = status;
        entity.updated_at = now_timestamp();
    }

    fn parent_share_id(&self, _entity: &FileShare) -> Option<String> {
        // A share's clone source is a snapshot, which carries no
        // dependents check; no parent lock is needed.
        None
    }

    fn prepare_create(&self, ctx: &RequestContext, entity: &mut FileShare) -> Result<()> {
        if entity.name.is_empty() {
            return Err(Error::InvalidRequest("share name is required".into()));
        }
        if entity.size <= 0 {
            return Err(Error::InvalidRequest(format!(
                "share size must be positive, got {}",
                entity.size
            )));
        }

        stamp_ownership(
            ctx,
            &mut entity.id,
            &mut entity.created_at,
            &mut entity.updated_at,
            &mut entity.tenant_id,
            &mut entity.user_id,
        );

        if entity.availability_zone.is_empty() {
            entity.availability_zone = "default".into();
        }
        entity.status = ResourceStatus::Creating;
        // Export locations are backend-populated; ignore caller-supplied ones.
        entity.export_locations.clear();

        Ok(())
    }

    async fn resolve_parent(&self, ctx: &RequestContext, entity: &mut FileShare) -> Result<()> {
        if let Some(snapshot_id) = entity.snapshot_id.clone() {
            let snapshot = self.catalog.get_snapshot(ctx, &snapshot_id).await?;
            if entity.snapshot_name.is_none() {
                entity.snapshot_name = Some(snapshot.name);
            }
        }
        Ok(())
    }

    async fn fetch(&self, ctx: &RequestContext, id: &str) -> Result<FileShare> {
        self.catalog.get_share(ctx, id).await
    }

    async fn persist(&self, ctx: &RequestContext, entity: FileShare) -> Result<FileShare> {
        self.catalog.create_share(ctx, entity).await
    }

    async fn update_record(&self, ctx: &RequestContext, entity: FileShare) -> Result<FileShare> {
        self.catalog.update_share(ctx, entity).await
    }

    async fn remove_record(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        self.catalog.delete_share(ctx, id).await
    }

    async fn dispatch_create(
        &self,
        ctx: &RequestContext,
        entity: &FileShare,
        profile: &Profile,
    ) -> Result<FileShare> {
        self.dispatcher.create_share(ctx, entity, profile).await
    }

    async fn dispatch_delete(
        &self,
        ctx: &RequestContext,
        entity: &FileShare,
        profile: &Profile,
    ) -> Result<()> {
        self.dispatcher.delete_share(ctx, entity, profile).await
    }

    async fn dependents(&self, ctx: &RequestContext, id: &str) -> Result<Vec<String>> {
        self.guard.share_dependents(ctx, id).await
    }
}

// =============================================================================
// Snapshot Lifecycle
// =============================================================================

pub struct SnapshotLifecycle {
    catalog: CatalogRef,
    dispatcher: DispatcherRef,
}

impl SnapshotLifecycle {
    pub fn new(catalog: CatalogRef, dispatcher: DispatcherRef) -> Self {
        Self {
            catalog,
            dispatcher,
        }
    }
}

#[async_trait]
impl ResourceLifecycle for SnapshotLifecycle {
    type Entity = FileShareSnapshot;

    fn kind(&self) -> ResourceKind {
        ResourceKind::FileShareSnapshot
    }

    fn entity_id(&self, entity: &FileShareSnapshot) -> String {
        entity.id.clone()
    }

    fn entity_profile_id(&self, entity: &FileShareSnapshot) -> Option<String> {
        if entity.profile_id.is_empty() {
            None
        } else {
            Some(entity.profile_id.clone())
        }
    }

    fn set_profile(&self, entity: &mut FileShareSnapshot, profile: &Profile) {
        entity.profile_id = profile.id.clone();
    }

    fn set_status(&self, entity: &mut FileShareSnapshot, status: ResourceStatus) {
        entity.status = status;
        entity.updated_at = now_timestamp();
    }

    fn parent_share_id(&self, entity: &FileShareSnapshot) -> Option<String> {
        Some(entity.fileshare_id.clone())
    }

    fn prepare_create(&self, ctx: &RequestContext, entity: &mut FileShareSnapshot) -> Result<()> {
        if entity.fileshare_id.is_empty() {
            return Err(Error::InvalidRequest(
                "snapshot fileshareId is required".into(),
            ));
        }

        stamp_ownership(
            ctx,
            &mut entity.id,
            &mut entity.created_at,
            &mut entity.updated_at,
            &mut entity.tenant_id,
            &mut entity.user_id,
        );
        entity.status = ResourceStatus::Creating;

        Ok(())
    }

    async fn resolve_parent(
        &self,
        ctx: &RequestContext,
        entity: &mut FileShareSnapshot,
    ) -> Result<()> {
        let share = self.catalog.get_share(ctx, &entity.fileshare_id).await?;
        if share.status != ResourceStatus::Available {
            return Err(Error::InvalidRequest(format!(
                "share {} is not available (status {})",
                share.id, share.status
            )));
        }
        entity.share_size = share.size;
        if entity.snapshot_size == 0 {
            entity.snapshot_size = share.size;
        }
        Ok(())
    }

    async fn fetch(&self, ctx: &RequestContext, id: &str) -> Result<FileShareSnapshot> {
        self.catalog.get_snapshot(ctx, id).await
    }

    async fn persist(
        &self,
        ctx: &RequestContext,
        entity: FileShareSnapshot,
    ) -> Result<FileShareSnapshot> {
        self.catalog.create_snapshot(ctx, entity).await
    }

    async fn update_record(
        &self,
        ctx: &RequestContext,
        entity: FileShareSnapshot,
    ) -> Result<FileShareSnapshot> {
        self.catalog.update_snapshot(ctx, entity).await
    }

    async fn remove_record(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        self.catalog.delete_snapshot(ctx, id).await
    }

    async fn dispatch_create(
        &self,
        ctx: &RequestContext,
        entity: &FileShareSnapshot,
        profile: &Profile,
    ) -> Result<FileShareSnapshot> {
        self.dispatcher.create_snapshot(ctx, entity, profile).await
    }

    async fn dispatch_delete(
        &self,
        ctx: &RequestContext,
        entity: &FileShareSnapshot,
        profile: &Profile,
    ) -> Result<()> {
        self.dispatcher.delete_snapshot(ctx, entity, profile).await
    }

    async fn dependents(&self, _ctx: &RequestContext, _id: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

// =============================================================================
// ACL Lifecycle
// =============================================================================

pub struct AclLifecycle {
    catalog: CatalogRef,
    dispatcher: DispatcherRef,
}

impl AclLifecycle {
    pub fn new(catalog: CatalogRef, dispatcher: DispatcherRef) -> Self {
        Self {
            catalog,
            dispatcher,
        }
    }
}

#[async_trait]
impl ResourceLifecycle for AclLifecycle {
    type Entity = FileShareAcl;

    fn kind(&self) -> ResourceKind {
        ResourceKind::FileShareAcl
    }

    fn entity_id(&self, entity: &FileShareAcl) -> String {
        entity.id.clone()
    }

    fn entity_profile_id(&self, entity: &FileShareAcl) -> Option<String> {
        if entity.profile_id.is_empty() {
            None
        } else {
            Some(entity.profile_id.clone())
        }
    }

    fn set_profile(&self, entity: &mut FileShareAcl, profile: &Profile) {
        entity.profile_id = profile.id.clone();
    }

    fn set_status(&self, entity: &mut FileShareAcl, status: ResourceStatus) {
        entity.status = status;
        entity.updated_at = now_timestamp();
    }

    fn parent_share_id(&self, entity: &FileShareAcl) -> Option<String> {
        Some(entity.fileshare_id.clone())
    }

    fn prepare_create(&self, ctx: &RequestContext, entity: &mut FileShareAcl) -> Result<()> {
        if entity.fileshare_id.is_empty() {
            return Err(Error::InvalidRequest("acl fileshareId is required".into()));
        }
        if entity.access_to.is_empty() {
            return Err(Error::InvalidRequest("acl accessTo is required".into()));
        }
        if entity.access_type.is_empty() {
            entity.access_type = "ip".into();
        } else if entity.access_type != "ip" {
            return Err(Error::InvalidRequest(format!(
                "unsupported acl type: {}",
                entity.access_type
            )));
        }
        if entity.access_capability.is_empty() {
            return Err(Error::InvalidRequest(
                "acl accessCapability is required".into(),
            ));
        }
        for capability in &entity.access_capability {
            let normalized = capability.to_lowercase();
            if normalized != "read" && normalized != "write" {
                return Err(Error::InvalidRequest(format!(
                    "unsupported access capability: {}",
                    capability
                )));
            }
        }

        stamp_ownership(
            ctx,
            &mut entity.id,
            &mut entity.created_at,
            &mut entity.updated_at,
            &mut entity.tenant_id,
            &mut entity.user_id,
        );
        entity.status = ResourceStatus::Creating;

        Ok(())
    }

    async fn resolve_parent(&self, ctx: &RequestContext, entity: &mut FileShareAcl) -> Result<()> {
        let share = self.catalog.get_share(ctx, &entity.fileshare_id).await?;
        if share.status != ResourceStatus::Available {
            return Err(Error::InvalidRequest(format!(
                "share {} is not available (status {})",
                share.id, share.status
            )));
        }
        Ok(())
    }

    async fn fetch(&self, ctx: &RequestContext, id: &str) -> Result<FileShareAcl> {
        self.catalog.get_acl(ctx, id).await
    }

    async fn persist(&self, ctx: &RequestContext, entity: FileShareAcl) -> Result<FileShareAcl> {
        self.catalog.create_acl(ctx, entity).await
    }

    async fn update_record(
        &self,
        ctx: &RequestContext,
        entity: FileShareAcl,
    ) -> Result<FileShareAcl> {
        self.catalog.update_acl(ctx, entity).await
    }

    async fn remove_record(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        self.catalog.delete_acl(ctx, id).await
    }

    async fn dispatch_create(
        &self,
        ctx: &RequestContext,
        entity: &FileShareAcl,
        profile: &Profile,
    ) -> Result<FileShareAcl> {
        self.dispatcher.create_acl(ctx, entity, profile).await
    }

    async fn dispatch_delete(
        &self,
        ctx: &RequestContext,
        entity: &FileShareAcl,
        profile: &Profile,
    ) -> Result<()> {
        self.dispatcher.delete_acl(ctx, entity, profile).await
    }

    async fn dependents(&self, _ctx: &RequestContext, _id: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::dispatch::LoopbackDispatcher;
    use std::sync::Arc;

    fn share_lifecycle() -> ShareLifecycle {
        ShareLifecycle::new(
            Arc::new(MemoryCatalog::new()),
            Arc::new(LoopbackDispatcher::default()),
        )
    }

    #[test]
    fn test_share_prepare_rejects_bad_payload() {
        let lifecycle = share_lifecycle();
        let ctx = RequestContext::admin();

        let mut nameless = FileShare {
            size: 1,
            ..Default::default()
        };
        assert!(lifecycle.prepare_create(&ctx, &mut nameless).is_err());

        let mut zero_sized = FileShare {
            name: "alpha".into(),
            size: 0,
            ..Default::default()
        };
        assert!(lifecycle.prepare_create(&ctx, &mut zero_sized).is_err());
    }

    #[test]
    fn test_share_prepare_assigns_defaults() {
        let lifecycle = share_lifecycle();
        let ctx = RequestContext::admin();

        let mut share = FileShare {
            name: "alpha".into(),
            size: 1,
            export_locations: vec!["bogus:/stale".into()],
            ..Default::default()
        };
        lifecycle.prepare_create(&ctx, &mut share).unwrap();

        assert!(!share.id.is_empty());
        assert_eq!(share.availability_zone, "default");
        assert_eq!(share.status, ResourceStatus::Creating);
        assert_eq!(share.tenant_id, "admin");
        assert!(share.export_locations.is_empty());
        assert!(!share.created_at.is_empty());
    }

    #[test]
    fn test_share_prepare_keeps_explicit_id() {
        let lifecycle = share_lifecycle();
        let ctx = RequestContext::admin();

        let mut share = FileShare {
            id: "d2975ebe-d82c-430f-b28e-f373746a71ca".into(),
            name: "sample-fileshare-01".into(),
            size: 1,
            ..Default::default()
        };
        lifecycle.prepare_create(&ctx, &mut share).unwrap();
        assert_eq!(share.id, "d2975ebe-d82c-430f-b28e-f373746a71ca");
    }

    #[test]
    fn test_acl_prepare_validates_capabilities() {
        let lifecycle = AclLifecycle::new(
            Arc::new(MemoryCatalog::new()),
            Arc::new(LoopbackDispatcher::default()),
        );
        let ctx = RequestContext::admin();

        let mut acl = FileShareAcl {
            fileshare_id: "s-1".into(),
            access_to: "10.32.109.15".into(),
            access_capability: vec!["Read".into(), "Execute".into()],
            ..Default::default()
        };
        assert!(lifecycle.prepare_create(&ctx, &mut acl).is_err());

        acl.access_capability = vec!["Read".into(), "Write".into()];
        lifecycle.prepare_create(&ctx, &mut acl).unwrap();
        assert_eq!(acl.access_type, "ip");
    }

    #[test]
    fn test_parent_lock_targets() {
        let catalog: CatalogRef = Arc::new(MemoryCatalog::new());
        let dispatcher: crate::dispatch::DispatcherRef = Arc::new(LoopbackDispatcher::default());

        let shares = ShareLifecycle::new(catalog.clone(), dispatcher.clone());
        let snapshots = SnapshotLifecycle::new(catalog.clone(), dispatcher.clone());
        let acls = AclLifecycle::new(catalog, dispatcher);

        let share = FileShare::default();
        assert_eq!(shares.parent_share_id(&share), None);

        let snapshot = FileShareSnapshot {
            fileshare_id: "s-1".into(),
            ..Default::default()
        };
        assert_eq!(snapshots.parent_share_id(&snapshot).as_deref(), Some("s-1"));

        let acl = FileShareAcl {
            fileshare_id: "s-1".into(),
            ..Default::default()
        };
        assert_eq!(acls.parent_share_id(&acl).as_deref(), Some("s-1"));
    }
}
