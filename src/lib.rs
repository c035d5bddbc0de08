//! File Share Control Plane
//!
//! A control-plane service managing network file shares, their snapshots,
//! and their access rules. Every mutation flows through one orchestrator
//! that validates the request, resolves its storage profile, guards
//! referential integrity, and dispatches provisioning work to a backend
//! driver.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       REST API (axum)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 Resource Lifecycle Orchestrator              │
//! │  ┌──────────────┐ ┌────────────────┐ ┌───────────────────┐  │
//! │  │   Profile    │ │   Integrity    │ │   Per-Resource    │  │
//! │  │   Resolver   │ │     Guard      │ │  Advisory Locks   │  │
//! │  └──────────────┘ └────────────────┘ └───────────────────┘  │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │       Catalog (store)        │     Dispatcher (driver)      │
//! │  ┌────────────────────────┐  │  ┌────────┐  ┌────────────┐  │
//! │  │  MemoryCatalog / ...   │  │  │  HTTP  │  │  Loopback  │  │
//! │  └────────────────────────┘  │  └────────┘  └────────────┘  │
//! └──────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`api`]: REST surface and server lifecycle
//! - [`orchestrator`]: lifecycle routines, profile resolution, integrity guard
//! - [`catalog`]: resource catalog port and in-memory adapter
//! - [`dispatch`]: backend driver port and adapters
//! - [`model`]: resource entities and statuses
//! - [`error`]: error types and handling

pub mod api;
pub mod catalog;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod orchestrator;

// Re-export commonly used types
pub use api::{ApiServer, ApiServerConfig, RestRouter};

pub use catalog::{Catalog, CatalogRef, ListFilter, MemoryCatalog, SortDir};

pub use context::RequestContext;

pub use dispatch::{
    Dispatcher, DispatcherRef, HttpDriverConfig, HttpDriverDispatcher, LoopbackConfig,
    LoopbackDispatcher,
};

pub use error::{Error, Result, StatusFamily};

pub use model::{
    FileShare, FileShareAcl, FileShareSnapshot, Profile, ResourceKind, ResourceStatus,
};

pub use orchestrator::{
    DeleteFailurePolicy, MetadataPatch, Orchestrator, OrchestratorConfig, ProfileResolver,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
