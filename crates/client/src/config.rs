//! Client configuration: backend addresses and reconnect policy.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_WS_URL: &str = "ws://localhost:8000";

/// Bounds for the live channel's reconnection loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
	/// Consecutive handshake failures tolerated before giving up.
	pub max_attempts: u32,
	/// Delay before the first retry; grows linearly with the attempt number.
	pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 5,
			base_delay: Duration::from_secs(1),
		}
	}
}

/// Startup configuration for [`VoxClient`](crate::VoxClient).
///
/// Addresses are resolved once at startup; they are not part of the core's
/// runtime behavior.
#[derive(Debug, Clone)]
pub struct ClientConfig {
	/// Base address for HTTP endpoints.
	pub api_url: Url,
	/// Base address for the streaming endpoint.
	pub ws_url: Url,
	pub reconnect: ReconnectPolicy,
	/// Override for the credential file location; `None` uses the
	/// per-user config directory.
	pub credentials_path: Option<std::path::PathBuf>,
}

impl ClientConfig {
	/// Builds a config from explicit addresses.
	pub fn new(api_url: &str, ws_url: &str) -> Result<Self> {
		Ok(Self {
			api_url: parse_url(api_url)?,
			ws_url: parse_url(ws_url)?,
			reconnect: ReconnectPolicy::default(),
			credentials_path: None,
		})
	}

	/// Resolves addresses from `VOXLENS_API_URL` / `VOXLENS_WS_URL`, falling
	/// back to the localhost defaults.
	pub fn from_env() -> Result<Self> {
		let api = std::env::var("VOXLENS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
		let ws = std::env::var("VOXLENS_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string());
		Self::new(&api, &ws)
	}

	pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
		self.reconnect = reconnect;
		self
	}

	pub fn with_credentials_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
		self.credentials_path = Some(path.into());
		self
	}
}

fn parse_url(raw: &str) -> Result<Url> {
	Url::parse(raw).map_err(|err| Error::Protocol(format!("invalid address {raw:?}: {err}")))
}
