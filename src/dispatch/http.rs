//! HTTP driver dispatcher
//!
//! Reaches the backend driver over HTTP, posting the serialized opts for
//! each provisioning call. Transient transport failures are retried with
//! exponential backoff; driver-reported failures are permanent.

use crate::context::RequestContext;
use crate::dispatch::{
    CreateAclOpts, CreateShareOpts, CreateSnapshotOpts, DeleteAclOpts, DeleteShareOpts,
    DeleteSnapshotOpts, Dispatcher,
};
use crate::error::{Error, Result};
use crate::model::{FileShare, FileShareAcl, FileShareSnapshot, Profile};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the HTTP driver dispatcher
#[derive(Debug, Clone)]
pub struct HttpDriverConfig {
    /// Driver base endpoint
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Total retry budget in seconds for transient failures
    pub retry_budget_secs: u64,
}

impl Default for HttpDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://fileshare-driver:50049".to_string(),
            request_timeout_secs: 30,
            retry_budget_secs: 60,
        }
    }
}

/// Acknowledgement body returned by the driver for delete calls
#[derive(Debug, Deserialize)]
struct DriverAck {}

// =============================================================================
// HTTP Driver Dispatcher
// =============================================================================

/// Dispatcher adapter that reaches the driver over HTTP
pub struct HttpDriverDispatcher {
    config: HttpDriverConfig,
    client: reqwest::Client,
}

impl HttpDriverDispatcher {
    pub fn new(config: HttpDriverConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_budget_secs)),
            ..Default::default()
        }
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path);

        let operation = || async {
            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_connect() || e.is_timeout() {
                        warn!("Driver call to {} failed transiently: {}", url, e);
                        backoff::Error::transient(Error::DriverUnreachable(e))
                    } else {
                        backoff::Error::permanent(Error::DriverUnreachable(e))
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                let reason = response.text().await.unwrap_or_default();
                return Err(backoff::Error::permanent(Error::DispatchFailed {
                    operation: path.to_string(),
                    reason: format!("driver returned {}: {}", status, reason),
                }));
            }

            response
                .json::<Resp>()
                .await
                .map_err(|e| backoff::Error::permanent(Error::DriverUnreachable(e)))
        };

        let result = backoff::future::retry(self.backoff(), operation).await?;
        debug!("Driver call {} succeeded", path);
        Ok(result)
    }
}

#[async_trait]
impl Dispatcher for HttpDriverDispatcher {
    async fn create_share(
        &self,
        ctx: &RequestContext,
        share: &FileShare,
        profile: &Profile,
    ) -> Result<FileShare> {
        let opts = CreateShareOpts::build(ctx, share, profile)?;
        self.post_json("v1/driver/shares", &opts).await
    }

    async fn delete_share(
        &self,
        ctx: &RequestContext,
        share: &FileShare,
        profile: &Profile,
    ) -> Result<()> {
        let opts = DeleteShareOpts::build(ctx, share, profile)?;
        let _: DriverAck = self.post_json("v1/driver/shares/delete", &opts).await?;
        Ok(())
    }

    async fn create_snapshot(
        &self,
        ctx: &RequestContext,
        snapshot: &FileShareSnapshot,
        profile: &Profile,
    ) -> Result<FileShareSnapshot> {
        let opts = CreateSnapshotOpts::build(ctx, snapshot, profile)?;
        self.post_json("v1/driver/snapshots", &opts).await
    }

    async fn delete_snapshot(
        &self,
        ctx: &RequestContext,
        snapshot: &FileShareSnapshot,
        profile: &Profile,
    ) -> Result<()> {
        let opts = DeleteSnapshotOpts::build(ctx, snapshot, profile)?;
        let _: DriverAck = self.post_json("v1/driver/snapshots/delete", &opts).await?;
        Ok(())
    }

    async fn create_acl(
        &self,
        ctx: &RequestContext,
        acl: &FileShareAcl,
        profile: &Profile,
    ) -> Result<FileShareAcl> {
        let opts = CreateAclOpts::build(ctx, acl, profile)?;
        self.post_json("v1/driver/acls", &opts).await
    }

    async fn delete_acl(
        &self,
        ctx: &RequestContext,
        acl: &FileShareAcl,
        profile: &Profile,
    ) -> Result<()> {
        let opts = DeleteAclOpts::build(ctx, acl, profile)?;
        let _: DriverAck = self.post_json("v1/driver/acls/delete", &opts).await?;
        Ok(())
    }
}
