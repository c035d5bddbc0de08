//! In-memory catalog
//!
//! DashMap-backed implementation of the catalog port, used in standalone
//! mode and throughout the test suite. Filtering is applied over the
//! serialized (camelCase) field names so equality matches and sort keys use
//! the same vocabulary the REST surface forwards.

use crate::catalog::{Catalog, ListFilter, SortDir};
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::model::{FileShare, FileShareAcl, FileShareSnapshot, Profile, ResourceKind};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::RwLock;

// =============================================================================
// Filter Evaluation
// =============================================================================

fn field_as_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Apply equality matches, sort, and pagination to a snapshot of records.
fn apply_filter<T: Serialize>(items: Vec<T>, filter: &ListFilter) -> Vec<T> {
    let mut keyed: Vec<(serde_json::Map<String, serde_json::Value>, T)> = items
        .into_iter()
        .filter_map(|item| match serde_json::to_value(&item) {
            Ok(serde_json::Value::Object(map)) => Some((map, item)),
            _ => None,
        })
        .collect();

    keyed.retain(|(map, _)| {
        filter.matches.iter().all(|(key, expected)| {
            map.get(key)
                .map(|v| field_as_string(v) == *expected)
                .unwrap_or(false)
        })
    });

    if let Some(sort_key) = &filter.sort_key {
        keyed.sort_by(|(a, _), (b, _)| {
            let left = a.get(sort_key).map(field_as_string).unwrap_or_default();
            let right = b.get(sort_key).map(field_as_string).unwrap_or_default();
            match filter.sort_dir {
                SortDir::Asc => left.cmp(&right),
                SortDir::Desc => right.cmp(&left),
            }
        });
    }

    let offset = filter.offset.unwrap_or(0);
    let limit = filter.limit.unwrap_or(usize::MAX);

    keyed
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|(_, item)| item)
        .collect()
}

// =============================================================================
// Memory Catalog
// =============================================================================

/// In-memory catalog backed by DashMap
pub struct MemoryCatalog {
    shares: DashMap<String, FileShare>,
    snapshots: DashMap<String, FileShareSnapshot>,
    acls: DashMap<String, FileShareAcl>,
    profiles: DashMap<String, Profile>,
    default_profile_id: RwLock<Option<String>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            shares: DashMap::new(),
            snapshots: DashMap::new(),
            acls: DashMap::new(),
            profiles: DashMap::new(),
            default_profile_id: RwLock::new(None),
        }
    }

    /// Register a profile, optionally marking it the tenant default.
    pub async fn register_profile(&self, profile: Profile, default: bool) {
        let id = profile.id.clone();
        self.profiles.insert(id.clone(), profile);
        if default {
            *self.default_profile_id.write().await = Some(id);
        }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn get_share(&self, _ctx: &RequestContext, id: &str) -> Result<FileShare> {
        self.shares
            .get(id)
            .map(|entry| entry.clone())
            .ok_or_else(|| Error::not_found(ResourceKind::FileShare.as_str(), id))
    }

    async fn list_shares(
        &self,
        _ctx: &RequestContext,
        filter: &ListFilter,
    ) -> Result<Vec<FileShare>> {
        let items: Vec<FileShare> = self.shares.iter().map(|e| e.value().clone()).collect();
        Ok(apply_filter(items, filter))
    }

    async fn create_share(&self, _ctx: &RequestContext, share: FileShare) -> Result<FileShare> {
        if self.shares.contains_key(&share.id) {
            return Err(Error::Conflict {
                kind: ResourceKind::FileShare.as_str().into(),
                id: share.id.clone(),
                reason: "record already exists".into(),
            });
        }
        self.shares.insert(share.id.clone(), share.clone());
        Ok(share)
    }

    async fn update_share(&self, _ctx: &RequestContext, share: FileShare) -> Result<FileShare> {
        if !self.shares.contains_key(&share.id) {
            return Err(Error::not_found(ResourceKind::FileShare.as_str(), &share.id));
        }
        self.shares.insert(share.id.clone(), share.clone());
        Ok(share)
    }

    async fn delete_share(&self, _ctx: &RequestContext, id: &str) -> Result<()> {
        self.shares
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(ResourceKind::FileShare.as_str(), id))
    }

    async fn get_snapshot(&self, _ctx: &RequestContext, id: &str) -> Result<FileShareSnapshot> {
        self.snapshots
            .get(id)
            .map(|entry| entry.clone())
            .ok_or_else(|| Error::not_found(ResourceKind::FileShareSnapshot.as_str(), id))
    }

    async fn list_snapshots(
        &self,
        _ctx: &RequestContext,
        filter: &ListFilter,
    ) -> Result<Vec<FileShareSnapshot>> {
        let items: Vec<FileShareSnapshot> =
            self.snapshots.iter().map(|e| e.value().clone()).collect();
        Ok(apply_filter(items, filter))
    }

    async fn list_snapshots_by_share(
        &self,
        _ctx: &RequestContext,
        share_id: &str,
    ) -> Result<Vec<FileShareSnapshot>> {
        Ok(self
            .snapshots
            .iter()
            .filter(|e| e.value().fileshare_id == share_id)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn create_snapshot(
        &self,
        _ctx: &RequestContext,
        snapshot: FileShareSnapshot,
    ) -> Result<FileShareSnapshot> {
        if self.snapshots.contains_key(&snapshot.id) {
            return Err(Error::Conflict {
                kind: ResourceKind::FileShareSnapshot.as_str().into(),
                id: snapshot.id.clone(),
                reason: "record already exists".into(),
            });
        }
        self.snapshots.insert(snapshot.id.clone(), snapshot.clone());
        Ok(snapshot)
    }

    async fn update_snapshot(
        &self,
        _ctx: &RequestContext,
        snapshot: FileShareSnapshot,
    ) -> Result<FileShareSnapshot> {
        if !self.snapshots.contains_key(&snapshot.id) {
            return Err(Error::not_found(
                ResourceKind::FileShareSnapshot.as_str(),
                &snapshot.id,
            ));
        }
        self.snapshots.insert(snapshot.id.clone(), snapshot.clone());
        Ok(snapshot)
    }

    async fn delete_snapshot(&self, _ctx: &RequestContext, id: &str) -> Result<()> {
        self.snapshots
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(ResourceKind::FileShareSnapshot.as_str(), id))
    }

    async fn get_acl(&self, _ctx: &RequestContext, id: &str) -> Result<FileShareAcl> {
        self.acls
            .get(id)
            .map(|entry| entry.clone())
            .ok_or_else(|| Error::not_found(ResourceKind::FileShareAcl.as_str(), id))
    }

    async fn list_acls(
        &self,
        _ctx: &RequestContext,
        filter: &ListFilter,
    ) -> Result<Vec<FileShareAcl>> {
        let items: Vec<FileShareAcl> = self.acls.iter().map(|e| e.value().clone()).collect();
        Ok(apply_filter(items, filter))
    }

    async fn list_acls_by_share(
        &self,
        _ctx: &RequestContext,
        share_id: &str,
    ) -> Result<Vec<FileShareAcl>> {
        Ok(self
            .acls
            .iter()
            .filter(|e| e.value().fileshare_id == share_id)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn create_acl(&self, _ctx: &RequestContext, acl: FileShareAcl) -> Result<FileShareAcl> {
        if self.acls.contains_key(&acl.id) {
            return Err(Error::Conflict {
                kind: ResourceKind::FileShareAcl.as_str().into(),
                id: acl.id.clone(),
                reason: "record already exists".into(),
            });
        }
        self.acls.insert(acl.id.clone(), acl.clone());
        Ok(acl)
    }

    async fn update_acl(&self, _ctx: &RequestContext, acl: FileShareAcl) -> Result<FileShareAcl> {
        if !self.acls.contains_key(&acl.id) {
            return Err(Error::not_found(ResourceKind::FileShareAcl.as_str(), &acl.id));
        }
        self.acls.insert(acl.id.clone(), acl.clone());
        Ok(acl)
    }

    async fn delete_acl(&self, _ctx: &RequestContext, id: &str) -> Result<()> {
        self.acls
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(ResourceKind::FileShareAcl.as_str(), id))
    }

    async fn get_profile(&self, _ctx: &RequestContext, id: &str) -> Result<Profile> {
        self.profiles
            .get(id)
            .map(|entry| entry.clone())
            .ok_or_else(|| Error::not_found(ResourceKind::Profile.as_str(), id))
    }

    async fn default_profile(&self, ctx: &RequestContext) -> Result<Profile> {
        let default_id = self.default_profile_id.read().await.clone();
        match default_id {
            Some(id) => self.get_profile(ctx, &id).await,
            None => Err(Error::Configuration(
                "no default file share profile registered".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn share(id: &str, name: &str) -> FileShare {
        FileShare {
            id: id.into(),
            name: name.into(),
            size: 1,
            availability_zone: "default".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_share_crud() {
        let catalog = MemoryCatalog::new();
        let ctx = RequestContext::admin();

        let created = catalog.create_share(&ctx, share("s-1", "alpha")).await.unwrap();
        assert_eq!(created.id, "s-1");

        let fetched = catalog.get_share(&ctx, "s-1").await.unwrap();
        assert_eq!(fetched, created);

        catalog.delete_share(&ctx, "s-1").await.unwrap();
        assert!(catalog.get_share(&ctx, "s-1").await.is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let catalog = MemoryCatalog::new();
        let ctx = RequestContext::admin();

        catalog.create_share(&ctx, share("s-1", "alpha")).await.unwrap();
        let err = catalog.create_share(&ctx, share("s-1", "beta")).await;
        assert!(matches!(err, Err(Error::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_list_sorted_first_page() {
        let catalog = MemoryCatalog::new();
        let ctx = RequestContext::admin();

        catalog.create_share(&ctx, share("s-2", "zeta")).await.unwrap();
        catalog.create_share(&ctx, share("s-1", "alpha")).await.unwrap();
        catalog.create_share(&ctx, share("s-3", "beta")).await.unwrap();

        let mut params = BTreeMap::new();
        params.insert("offset".to_string(), "0".to_string());
        params.insert("limit".to_string(), "1".to_string());
        params.insert("sortDir".to_string(), "asc".to_string());
        params.insert("sortKey".to_string(), "name".to_string());
        let filter = ListFilter::from_query(&params).unwrap();

        let page = catalog.list_shares(&ctx, &filter).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "alpha");
    }

    #[tokio::test]
    async fn test_list_equality_filter() {
        let catalog = MemoryCatalog::new();
        let ctx = RequestContext::admin();

        let mut other_zone = share("s-2", "beta");
        other_zone.availability_zone = "zone-b".into();
        catalog.create_share(&ctx, share("s-1", "alpha")).await.unwrap();
        catalog.create_share(&ctx, other_zone).await.unwrap();

        let mut params = BTreeMap::new();
        params.insert("availabilityZone".to_string(), "zone-b".to_string());
        let filter = ListFilter::from_query(&params).unwrap();

        let page = catalog.list_shares(&ctx, &filter).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "s-2");
    }

    #[tokio::test]
    async fn test_dependent_listings_by_share() {
        let catalog = MemoryCatalog::new();
        let ctx = RequestContext::admin();

        let snapshot = FileShareSnapshot {
            id: "snap-1".into(),
            fileshare_id: "s-1".into(),
            ..Default::default()
        };
        catalog.create_snapshot(&ctx, snapshot).await.unwrap();

        let acl = FileShareAcl {
            id: "acl-1".into(),
            fileshare_id: "s-1".into(),
            ..Default::default()
        };
        catalog.create_acl(&ctx, acl).await.unwrap();

        assert_eq!(
            catalog.list_snapshots_by_share(&ctx, "s-1").await.unwrap().len(),
            1
        );
        assert_eq!(catalog.list_acls_by_share(&ctx, "s-1").await.unwrap().len(), 1);
        assert!(catalog
            .list_snapshots_by_share(&ctx, "s-other")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_default_profile_requires_registration() {
        let catalog = MemoryCatalog::new();
        let ctx = RequestContext::admin();

        let err = catalog.default_profile(&ctx).await;
        assert!(matches!(err, Err(Error::Configuration(_))));

        let profile = Profile {
            id: "prof-1".into(),
            name: "default".into(),
            storage_type: "file".into(),
            ..Default::default()
        };
        catalog.register_profile(profile, true).await;

        let resolved = catalog.default_profile(&ctx).await.unwrap();
        assert_eq!(resolved.id, "prof-1");
    }
}
