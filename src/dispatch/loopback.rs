//! Loopback dispatcher
//!
//! In-process driver adapter used in standalone mode and tests. It
//! fabricates the authoritative representation a real driver would return:
//! an export location for new shares and `available` status on every
//! successful create.

use crate::context::RequestContext;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::model::{FileShare, FileShareAcl, FileShareSnapshot, Profile, ResourceStatus};
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{info, warn};

/// Configuration for the loopback dispatcher
#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    /// Host advertised in fabricated export locations
    pub export_host: String,
    /// Pool assigned when the request leaves placement open
    pub default_pool_id: String,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            export_host: "192.168.100.100".to_string(),
            default_pool_id: "loopback-pool".to_string(),
        }
    }
}

/// Dispatcher that provisions nothing and answers authoritatively
pub struct LoopbackDispatcher {
    config: LoopbackConfig,
    /// Ids this adapter has "provisioned", for delete sanity logging
    provisioned: DashMap<String, ()>,
}

impl LoopbackDispatcher {
    pub fn new(config: LoopbackConfig) -> Self {
        Self {
            config,
            provisioned: DashMap::new(),
        }
    }
}

impl Default for LoopbackDispatcher {
    fn default() -> Self {
        Self::new(LoopbackConfig::default())
    }
}

#[async_trait]
impl Dispatcher for LoopbackDispatcher {
    async fn create_share(
        &self,
        _ctx: &RequestContext,
        share: &FileShare,
        _profile: &Profile,
    ) -> Result<FileShare> {
        info!("Loopback create share: {} ({})", share.name, share.id);

        let mut created = share.clone();
        created.status = ResourceStatus::Available;
        created.export_locations = vec![format!("{}:/{}", self.config.export_host, share.name)];
        if created.pool_id.is_empty() {
            created.pool_id = self.config.default_pool_id.clone();
        }

        self.provisioned.insert(share.id.clone(), ());
        Ok(created)
    }

    async fn delete_share(
        &self,
        _ctx: &RequestContext,
        share: &FileShare,
        _profile: &Profile,
    ) -> Result<()> {
        if self.provisioned.remove(&share.id).is_none() {
            // Confirmed backend absence; removal still succeeds.
            warn!("Loopback delete for unknown share: {}", share.id);
        }
        Ok(())
    }

    async fn create_snapshot(
        &self,
        _ctx: &RequestContext,
        snapshot: &FileShareSnapshot,
        _profile: &Profile,
    ) -> Result<FileShareSnapshot> {
        info!(
            "Loopback create snapshot: {} of share {}",
            snapshot.id, snapshot.fileshare_id
        );

        let mut created = snapshot.clone();
        created.status = ResourceStatus::Available;
        if created.snapshot_size == 0 {
            created.snapshot_size = created.share_size;
        }

        self.provisioned.insert(snapshot.id.clone(), ());
        Ok(created)
    }

    async fn delete_snapshot(
        &self,
        _ctx: &RequestContext,
        snapshot: &FileShareSnapshot,
        _profile: &Profile,
    ) -> Result<()> {
        if self.provisioned.remove(&snapshot.id).is_none() {
            warn!("Loopback delete for unknown snapshot: {}", snapshot.id);
        }
        Ok(())
    }

    async fn create_acl(
        &self,
        _ctx: &RequestContext,
        acl: &FileShareAcl,
        _profile: &Profile,
    ) -> Result<FileShareAcl> {
        info!(
            "Loopback create acl: {} -> {} on share {}",
            acl.id, acl.access_to, acl.fileshare_id
        );

        let mut created = acl.clone();
        created.status = ResourceStatus::Available;

        self.provisioned.insert(acl.id.clone(), ());
        Ok(created)
    }

    async fn delete_acl(
        &self,
        _ctx: &RequestContext,
        acl: &FileShareAcl,
        _profile: &Profile,
    ) -> Result<()> {
        if self.provisioned.remove(&acl.id).is_none() {
            warn!("Loopback delete for unknown acl: {}", acl.id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_share_fabricates_export_location() {
        let dispatcher = LoopbackDispatcher::default();
        let ctx = RequestContext::admin();
        let share = FileShare {
            id: "s-1".into(),
            name: "alpha".into(),
            size: 1,
            ..Default::default()
        };

        let created = dispatcher
            .create_share(&ctx, &share, &Profile::default())
            .await
            .unwrap();

        assert_eq!(created.status, ResourceStatus::Available);
        assert_eq!(created.export_locations, vec!["192.168.100.100:/alpha"]);
        assert_eq!(created.pool_id, "loopback-pool");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dispatcher = LoopbackDispatcher::default();
        let ctx = RequestContext::admin();
        let share = FileShare {
            id: "s-1".into(),
            ..Default::default()
        };

        // Never created; delete still acknowledges.
        dispatcher
            .delete_share(&ctx, &share, &Profile::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_size_defaults_to_share_size() {
        let dispatcher = LoopbackDispatcher::default();
        let ctx = RequestContext::admin();
        let snapshot = FileShareSnapshot {
            id: "snap-1".into(),
            fileshare_id: "s-1".into(),
            share_size: 5,
            ..Default::default()
        };

        let created = dispatcher
            .create_snapshot(&ctx, &snapshot, &Profile::default())
            .await
            .unwrap();
        assert_eq!(created.snapshot_size, 5);
        assert_eq!(created.status, ResourceStatus::Available);
    }
}
