//! Request security context
//!
//! The context is constructed by an upstream collaborator (the API layer
//! derives it from request headers) and threaded through every catalog and
//! dispatcher call. This core never fabricates authorization state.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Security context attached to every inbound operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Owning tenant of the resources touched by this request
    pub tenant_id: String,
    /// Acting user
    pub user_id: String,
    /// Whether the caller holds the admin role
    pub is_admin: bool,
}

impl RequestContext {
    pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
            is_admin: false,
        }
    }

    /// Admin context used by operator tooling and tests
    pub fn admin() -> Self {
        Self {
            tenant_id: "admin".into(),
            user_id: "admin".into(),
            is_admin: true,
        }
    }

    /// Serialized form forwarded to the backend driver
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_json_round_trip() {
        let ctx = RequestContext::admin();
        let json = ctx.to_json().unwrap();
        assert!(json.contains("\"tenantId\":\"admin\""));

        let back: RequestContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }
}
