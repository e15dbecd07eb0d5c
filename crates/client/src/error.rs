//! Error taxonomy shared by every component of the client core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Classified failure from a client-core operation.
///
/// Variants carry owned data and are `Clone` so a single renewal outcome can
/// be shared across concurrent triggers (see `session`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// Local credential storage could not be written or removed.
	#[error("credential storage unavailable: {0}")]
	Storage(String),

	/// No response was received from the backend.
	#[error("network error: {0}")]
	Network(String),

	/// The backend rejected the current credential (HTTP 401).
	#[error("credential rejected by backend")]
	Auth,

	/// The backend rejected the request itself (other 4xx).
	#[error("request rejected ({status}): {message}")]
	Client { status: u16, message: String },

	/// The backend failed to process the request (5xx).
	#[error("server error ({status})")]
	Server { status: u16 },

	/// The live channel gave up reconnecting.
	#[error("live channel exhausted connectivity after {attempts} attempts")]
	ConnectivityExhausted { attempts: u32 },

	/// A supplied address or a response body was malformed.
	#[error("protocol error: {0}")]
	Protocol(String),
}

impl Error {
	/// Returns `true` for failures where no authoritative answer was
	/// received, i.e. the stored credentials may still be valid.
	pub fn is_transient(&self) -> bool {
		matches!(self, Error::Network(_) | Error::Server { .. })
	}
}
