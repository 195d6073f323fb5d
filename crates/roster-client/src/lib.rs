//! Client for the remote multi-tenant administration platform.
//!
//! Exposes the [`AdminApi`] trait the provisioning engine is written against,
//! the wire models it exchanges, and [`HttpAdminClient`], the reqwest-backed
//! implementation used in production.

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod models;

pub use api::{AdminApi, CatalogEntity, ReferenceKind};
pub use auth::{ApiAuth, ApiCredentials};
pub use client::HttpAdminClient;
pub use error::{ApiError, ApiResult};
