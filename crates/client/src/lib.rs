//! VoxLens client core: session lifecycle and live analysis updates.
//!
//! This crate is the non-presentational heart of the VoxLens dashboard
//! client. It owns four concerns:
//!
//! * [`store`] - durable persistence for the access/refresh credential pair
//! * [`gateway`] - outbound HTTP calls with credential injection and typed
//!   failure classification
//! * [`session`] - the authentication state machine, including silent
//!   renewal on an observed credential rejection
//! * [`channel`] - one resilient websocket subscription per analysis job,
//!   with bounded reconnection and ordered event dispatch
//!
//! [`VoxClient`] wires the pieces together and enforces the cross-component
//! ordering rules (logout closes any live channel before credentials are
//! cleared).

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod store;

pub use channel::{ChannelState, ListenerId, LiveChannel};
pub use client::VoxClient;
pub use config::{ClientConfig, ReconnectPolicy};
pub use error::{Error, Result};
pub use gateway::ApiGateway;
pub use session::{SessionManager, SessionSnapshot, SessionStatus};
pub use store::CredentialStore;
pub use vox_protocol as protocol;
