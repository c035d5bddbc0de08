//! Profile resolution
//!
//! Determines which storage policy governs a request: the explicitly named
//! profile, or the tenant default when the request leaves it out. Pure
//! read; the resolved profile is embedded in the provisional record and
//! forwarded with every backend dispatch.

use crate::catalog::CatalogRef;
use crate::context::RequestContext;
use crate::error::Result;
use crate::model::Profile;

/// Resolves the storage profile applied to a mutation request
pub struct ProfileResolver {
    catalog: CatalogRef,
}

impl ProfileResolver {
    pub fn new(catalog: CatalogRef) -> Self {
        Self { catalog }
    }

    /// Resolve an explicit profile id, or fall back to the tenant default.
    /// An explicit id that does not exist fails with NotFound; a missing
    /// default fails with Configuration.
    pub async fn resolve(
        &self,
        ctx: &RequestContext,
        profile_id: Option<&str>,
    ) -> Result<Profile> {
        match profile_id {
            Some(id) if !id.is_empty() => self.catalog.get_profile(ctx, id).await,
            _ => self.catalog.default_profile(ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::error::Error;
    use std::sync::Arc;

    fn profile(id: &str, name: &str) -> Profile {
        Profile {
            id: id.into(),
            name: name.into(),
            storage_type: "file".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_resolves_explicit_profile() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.register_profile(profile("p-1", "gold"), false).await;
        catalog.register_profile(profile("p-2", "default"), true).await;

        let resolver = ProfileResolver::new(catalog);
        let ctx = RequestContext::admin();

        let resolved = resolver.resolve(&ctx, Some("p-1")).await.unwrap();
        assert_eq!(resolved.name, "gold");
    }

    #[tokio::test]
    async fn test_falls_back_to_default() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.register_profile(profile("p-2", "default"), true).await;

        let resolver = ProfileResolver::new(catalog);
        let ctx = RequestContext::admin();

        let resolved = resolver.resolve(&ctx, None).await.unwrap();
        assert_eq!(resolved.id, "p-2");

        // Empty string is treated the same as absent.
        let resolved = resolver.resolve(&ctx, Some("")).await.unwrap();
        assert_eq!(resolved.id, "p-2");
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let catalog = Arc::new(MemoryCatalog::new());
        let resolver = ProfileResolver::new(catalog);
        let ctx = RequestContext::admin();

        let err = resolver.resolve(&ctx, Some("missing")).await;
        assert!(matches!(err, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_default_is_configuration_error() {
        let catalog = Arc::new(MemoryCatalog::new());
        let resolver = ProfileResolver::new(catalog);
        let ctx = RequestContext::admin();

        let err = resolver.resolve(&ctx, None).await;
        assert!(matches!(err, Err(Error::Configuration(_))));
    }
}
