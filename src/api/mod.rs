//! API layer: REST surface and server lifecycle

pub mod rest;
pub mod server;

pub use rest::{ApiErrorResponse, RestRouter};
pub use server::{ApiServer, ApiServerConfig};
