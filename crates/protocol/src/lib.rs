//! Wire types for the VoxLens backend API.
//!
//! This crate contains the serde-serializable types used for communication
//! with the VoxLens backend over HTTP and the analysis websocket. These types
//! represent the "protocol layer" - the shapes of data as they appear on the
//! wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * 1:1 with protocol: Match the backend's pydantic schemas
//! * Stable: Changes only when the wire protocol changes
//!
//! Higher-level ergonomic APIs are built on top of these types in `vox-client`.

pub mod auth;
pub mod stream;
pub mod user;

pub use auth::*;
pub use stream::*;
pub use user::*;
