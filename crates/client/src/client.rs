//! Top-level facade wiring config, session core, and live channel together.

use std::sync::Arc;

use vox_protocol::User;

use crate::channel::LiveChannel;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::gateway::ApiGateway;
use crate::session::{SessionManager, SessionStatus};
use crate::store::CredentialStore;

/// The assembled VoxLens client core.
///
/// Consumers go through the facade for lifecycle operations so the
/// cross-component ordering holds: logout closes the live channel before
/// credentials are cleared, and no authenticated stream outlives the session
/// that opened it.
pub struct VoxClient {
	gateway: Arc<ApiGateway>,
	session: SessionManager,
	channel: LiveChannel,
}

impl VoxClient {
	pub fn new(config: ClientConfig) -> Self {
		let gateway = Arc::new(ApiGateway::new(config.api_url.clone()));
		let store = config
			.credentials_path
			.as_ref()
			.map(CredentialStore::at_path)
			.unwrap_or_default();
		let session = SessionManager::new(Arc::clone(&gateway), store);
		let channel = LiveChannel::new(config.ws_url.clone(), config.reconnect.clone());
		Self {
			gateway,
			session,
			channel,
		}
	}

	/// Builds a client from `VOXLENS_API_URL` / `VOXLENS_WS_URL`.
	pub fn from_env() -> Result<Self> {
		Ok(Self::new(ClientConfig::from_env()?))
	}

	/// Gateway handle for business endpoints outside this core.
	pub fn gateway(&self) -> &ApiGateway {
		&self.gateway
	}

	pub fn session(&self) -> &SessionManager {
		&self.session
	}

	pub fn channel(&self) -> &LiveChannel {
		&self.channel
	}

	pub async fn login(&self, email: &str, password: &str) -> Result<User> {
		self.session.login(email, password).await
	}

	pub async fn bootstrap(&self) -> SessionStatus {
		self.session.bootstrap().await
	}

	/// Opens the live subscription for one analysis job, retiring any prior
	/// subscription held by this client.
	pub fn open_job(&self, job_id: &str) -> Result<()> {
		self.channel.open(job_id)
	}

	/// Closes the live channel first, then clears the session. Idempotent.
	pub fn logout(&self) {
		self.channel.close();
		self.session.logout();
	}
}
