//! Core domain types and shared logic for the Marquee media delivery server.
//!
//! This crate defines the data model and the pure decision logic used by the
//! other crates:
//! - Principals and resource descriptors
//! - Byte-range parsing
//! - Access policy
//! - Content type resolution

pub mod config;
pub mod content_type;
pub mod policy;
pub mod principal;
pub mod range;
pub mod resource;

pub use policy::{Decision, authorize, authorize_profile_image};
pub use principal::{Principal, PrincipalId};
pub use range::{ByteRange, RangeDecision};
pub use resource::{AssetKind, ResourceDescriptor};

/// Default size of each streamed body chunk: 64 KiB
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 64 * 1024;
