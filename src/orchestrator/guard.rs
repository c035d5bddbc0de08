//! Referential integrity guard
//!
//! Enumerates the dependents that block a destructive operation. A share
//! may not be deleted while any snapshot or ACL still references it;
//! snapshots and ACLs have no downstream dependents in this model. The
//! caller must hold the share's advisory lock so the check and the
//! following status transition are one logical step.

use crate::catalog::CatalogRef;
use crate::context::RequestContext;
use crate::error::Result;

/// Guard evaluating dependents ahead of destructive operations
pub struct IntegrityGuard {
    catalog: CatalogRef,
}

impl IntegrityGuard {
    pub fn new(catalog: CatalogRef) -> Self {
        Self { catalog }
    }

    /// Identifiers of resources blocking deletion of a share
    pub async fn share_dependents(
        &self,
        ctx: &RequestContext,
        share_id: &str,
    ) -> Result<Vec<String>> {
        let mut dependents = Vec::new();

        for snapshot in self.catalog.list_snapshots_by_share(ctx, share_id).await? {
            dependents.push(format!("snapshot/{}", snapshot.id));
        }
        for acl in self.catalog.list_acls_by_share(ctx, share_id).await? {
            dependents.push(format!("acl/{}", acl.id));
        }

        Ok(dependents)
    }
}
