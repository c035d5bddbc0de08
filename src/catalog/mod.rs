//! Catalog port - typed access to the persistent resource store
//!
//! The catalog is an external collaborator: an opaque keyed store with
//! query-filter semantics. This module defines the port the orchestrator is
//! constructed against (always injected, never a process global) plus the
//! pagination/sort filter forwarded verbatim from list requests.

pub mod memory;

pub use memory::MemoryCatalog;

use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::model::{FileShare, FileShareAcl, FileShareSnapshot, Profile};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// List Filter
// =============================================================================

/// Sort direction for filtered listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// Pagination/sort/equality filter forwarded to the catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub sort_dir: SortDir,
    pub sort_key: Option<String>,
    /// Arbitrary equality filters on entity fields (camelCase names)
    pub matches: BTreeMap<String, String>,
}

impl ListFilter {
    /// Build a filter from raw query parameters. Reserved keys (`offset`,
    /// `limit`, `sortDir`, `sortKey`) are parsed; everything else becomes an
    /// equality match.
    pub fn from_query(params: &BTreeMap<String, String>) -> Result<Self> {
        let mut filter = ListFilter::default();

        for (key, value) in params {
            match key.as_str() {
                "offset" => {
                    filter.offset = Some(value.parse().map_err(|_| {
                        Error::InvalidRequest(format!("invalid offset: {}", value))
                    })?);
                }
                "limit" => {
                    filter.limit = Some(value.parse().map_err(|_| {
                        Error::InvalidRequest(format!("invalid limit: {}", value))
                    })?);
                }
                "sortDir" => {
                    filter.sort_dir = match value.as_str() {
                        "asc" => SortDir::Asc,
                        "desc" => SortDir::Desc,
                        other => {
                            return Err(Error::InvalidRequest(format!(
                                "invalid sortDir: {} (expected asc or desc)",
                                other
                            )))
                        }
                    };
                }
                "sortKey" => {
                    filter.sort_key = Some(value.clone());
                }
                _ => {
                    filter.matches.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(filter)
    }
}

// =============================================================================
// Catalog Port
// =============================================================================

/// Port for the persistent resource catalog
///
/// Lookups return `NotFound` for absent identifiers and `CatalogFailure`
/// when the store itself misbehaves; the orchestrator decides how each
/// surfaces to callers.
#[async_trait]
pub trait Catalog: Send + Sync {
    // ---- file shares --------------------------------------------------------

    async fn get_share(&self, ctx: &RequestContext, id: &str) -> Result<FileShare>;

    async fn list_shares(
        &self,
        ctx: &RequestContext,
        filter: &ListFilter,
    ) -> Result<Vec<FileShare>>;

    async fn create_share(&self, ctx: &RequestContext, share: FileShare) -> Result<FileShare>;

    async fn update_share(&self, ctx: &RequestContext, share: FileShare) -> Result<FileShare>;

    async fn delete_share(&self, ctx: &RequestContext, id: &str) -> Result<()>;

    // ---- snapshots ----------------------------------------------------------

    async fn get_snapshot(&self, ctx: &RequestContext, id: &str) -> Result<FileShareSnapshot>;

    async fn list_snapshots(
        &self,
        ctx: &RequestContext,
        filter: &ListFilter,
    ) -> Result<Vec<FileShareSnapshot>>;

    /// Snapshots owned by a share; used by the referential integrity guard
    async fn list_snapshots_by_share(
        &self,
        ctx: &RequestContext,
        share_id: &str,
    ) -> Result<Vec<FileShareSnapshot>>;

    async fn create_snapshot(
        &self,
        ctx: &RequestContext,
        snapshot: FileShareSnapshot,
    ) -> Result<FileShareSnapshot>;

    async fn update_snapshot(
        &self,
        ctx: &RequestContext,
        snapshot: FileShareSnapshot,
    ) -> Result<FileShareSnapshot>;

    async fn delete_snapshot(&self, ctx: &RequestContext, id: &str) -> Result<()>;

    // ---- ACLs ---------------------------------------------------------------

    async fn get_acl(&self, ctx: &RequestContext, id: &str) -> Result<FileShareAcl>;

    async fn list_acls(
        &self,
        ctx: &RequestContext,
        filter: &ListFilter,
    ) -> Result<Vec<FileShareAcl>>;

    /// ACLs attached to a share; used by the referential integrity guard
    async fn list_acls_by_share(
        &self,
        ctx: &RequestContext,
        share_id: &str,
    ) -> Result<Vec<FileShareAcl>>;

    async fn create_acl(&self, ctx: &RequestContext, acl: FileShareAcl) -> Result<FileShareAcl>;

    async fn update_acl(&self, ctx: &RequestContext, acl: FileShareAcl) -> Result<FileShareAcl>;

    async fn delete_acl(&self, ctx: &RequestContext, id: &str) -> Result<()>;

    // ---- profiles -----------------------------------------------------------

    async fn get_profile(&self, ctx: &RequestContext, id: &str) -> Result<Profile>;

    /// Tenant default profile for file shares
    async fn default_profile(&self, ctx: &RequestContext) -> Result<Profile>;
}

pub type CatalogRef = Arc<dyn Catalog>;

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_filter_from_query() {
        let params = query(&[
            ("offset", "0"),
            ("limit", "1"),
            ("sortDir", "asc"),
            ("sortKey", "name"),
            ("availabilityZone", "default"),
        ]);

        let filter = ListFilter::from_query(&params).unwrap();
        assert_eq!(filter.offset, Some(0));
        assert_eq!(filter.limit, Some(1));
        assert_eq!(filter.sort_dir, SortDir::Asc);
        assert_eq!(filter.sort_key.as_deref(), Some("name"));
        assert_eq!(
            filter.matches.get("availabilityZone").map(String::as_str),
            Some("default")
        );
    }

    #[test]
    fn test_filter_rejects_bad_params() {
        let params = query(&[("offset", "minus-one")]);
        assert!(ListFilter::from_query(&params).is_err());

        let params = query(&[("sortDir", "sideways")]);
        assert!(ListFilter::from_query(&params).is_err());
    }

    #[test]
    fn test_filter_defaults() {
        let filter = ListFilter::from_query(&BTreeMap::new()).unwrap();
        assert_eq!(filter.offset, None);
        assert_eq!(filter.limit, None);
        assert_eq!(filter.sort_dir, SortDir::Asc);
        assert!(filter.matches.is_empty());
    }
}
