//! Authentication state machine: login, logout, bootstrap, silent renewal.
//!
//! The manager is the only writer of the credential store and of the
//! gateway's token slot. Renewal is purely reactive: it runs only after an
//! observed [`Error::Auth`], at most once per triggering failure, and
//! concurrent triggers share a single in-flight renewal future instead of
//! issuing competing refresh requests (refresh tokens are rotated, so a
//! second request would invalidate the first).

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};
use vox_protocol::{CredentialPair, LoginRequest, RefreshRequest, TokenResponse, User};

use crate::error::{Error, Result};
use crate::gateway::ApiGateway;
use crate::store::CredentialStore;

const LOGIN_PATH: &str = "/api/v1/auth/login";
const REFRESH_PATH: &str = "/api/v1/auth/refresh";
const ME_PATH: &str = "/api/v1/users/me";

/// Consumer-visible authentication status.
///
/// A successful silent renewal never passes through `Unauthenticated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
	Unauthenticated,
	Authenticating,
	Authenticated,
}

/// Read-only projection of the current session.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
	pub status: SessionStatus,
	pub user: Option<User>,
}

type RenewalFuture = Shared<BoxFuture<'static, Result<CredentialPair>>>;

struct SessionInner {
	gateway: Arc<ApiGateway>,
	store: CredentialStore,
	state: RwLock<SessionSnapshot>,
	/// Single in-flight renewal shared by all concurrent triggers.
	renewal: Mutex<Option<RenewalFuture>>,
}

/// Owner of the authentication state machine.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct SessionManager {
	inner: Arc<SessionInner>,
}

impl SessionManager {
	pub fn new(gateway: Arc<ApiGateway>, store: CredentialStore) -> Self {
		Self {
			inner: Arc::new(SessionInner {
				gateway,
				store,
				state: RwLock::new(SessionSnapshot {
					status: SessionStatus::Unauthenticated,
					user: None,
				}),
				renewal: Mutex::new(None),
			}),
		}
	}

	/// Returns the current `{status, user}` projection.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.inner.state.read().clone()
	}

	pub fn status(&self) -> SessionStatus {
		self.inner.state.read().status
	}

	/// Exchanges credentials for a token pair and settles Authenticated.
	///
	/// On any failure the session stays Unauthenticated and the gateway's
	/// classified error is surfaced unchanged; no retry is attempted here.
	pub async fn login(&self, email: &str, password: &str) -> Result<User> {
		self.set_status(SessionStatus::Authenticating);

		let request = LoginRequest {
			email: email.to_string(),
			password: password.to_string(),
		};
		let token: TokenResponse = match self.inner.gateway.post(LOGIN_PATH, &request).await {
			Ok(token) => token,
			Err(err) => {
				self.settle_unauthenticated();
				return Err(err);
			}
		};

		let pair = CredentialPair::from(token);
		if let Err(err) = self.install_pair(&pair) {
			self.settle_unauthenticated();
			return Err(err);
		}

		match self.inner.gateway.get::<User>(ME_PATH).await {
			Ok(user) => {
				info!(target = "vox.session", email, "login complete");
				self.settle_authenticated(user.clone());
				Ok(user)
			}
			Err(err) => {
				// The pair is persisted and may still be valid; a later
				// bootstrap() can pick it up.
				self.settle_unauthenticated();
				Err(err)
			}
		}
	}

	/// Clears credentials and resets to Unauthenticated. Idempotent.
	///
	/// Callers that hold a live channel must close it first;
	/// [`VoxClient::logout`](crate::VoxClient::logout) enforces that order.
	pub fn logout(&self) {
		if let Err(err) = self.inner.store.clear() {
			warn!(target = "vox.session", error = %err, "credential store clear failed during logout");
		}
		self.inner.gateway.clear_token();
		self.settle_unauthenticated();
		debug!(target = "vox.session", "logged out");
	}

	/// Restores a remembered session at process start.
	///
	/// * no stored pair: settles Unauthenticated without any network call
	/// * stored access credential accepted: settles Authenticated
	/// * rejected: exactly one renewal, then one retried user fetch; a
	///   second rejection settles Unauthenticated without another renewal
	/// * transient failure (network/5xx): settles Unauthenticated but keeps
	///   the stored pair - it may still be valid next time
	pub async fn bootstrap(&self) -> SessionStatus {
		let Some(pair) = self.inner.store.load() else {
			debug!(target = "vox.session", "no remembered session");
			self.settle_unauthenticated();
			return SessionStatus::Unauthenticated;
		};

		self.set_status(SessionStatus::Authenticating);
		self.inner.gateway.set_token(&pair.access_token);

		match self.inner.gateway.get::<User>(ME_PATH).await {
			Ok(user) => {
				info!(target = "vox.session", "remembered session restored");
				self.settle_authenticated(user);
				SessionStatus::Authenticated
			}
			Err(Error::Auth) => self.bootstrap_after_rejection().await,
			Err(err) => {
				// No authoritative answer; fail closed for this session but
				// keep the pair for the next attempt.
				warn!(target = "vox.session", error = %err, "bootstrap failed transiently; keeping stored credentials");
				self.settle_unauthenticated();
				SessionStatus::Unauthenticated
			}
		}
	}

	async fn bootstrap_after_rejection(&self) -> SessionStatus {
		if let Err(err) = self.renew().await {
			debug!(target = "vox.session", error = %err, "renewal failed; discarding credentials");
			self.discard_credentials();
			self.settle_unauthenticated();
			return SessionStatus::Unauthenticated;
		}

		match self.inner.gateway.get::<User>(ME_PATH).await {
			Ok(user) => {
				info!(target = "vox.session", "session restored after renewal");
				self.settle_authenticated(user);
				SessionStatus::Authenticated
			}
			Err(err) => {
				// At most one renewal per triggering failure: a second
				// rejection settles without trying again.
				if err == Error::Auth {
					self.discard_credentials();
				}
				warn!(target = "vox.session", error = %err, "user fetch failed after renewal");
				self.settle_unauthenticated();
				SessionStatus::Unauthenticated
			}
		}
	}

	/// Renews the credential pair, deduplicating concurrent triggers.
	///
	/// The first caller installs a shared future in the slot; later callers
	/// clone and await the same future, so exactly one refresh request goes
	/// out and every trigger observes the same outcome.
	async fn renew(&self) -> Result<CredentialPair> {
		let renewal = {
			let mut slot = self.inner.renewal.lock();
			if let Some(inflight) = slot.as_ref() {
				debug!(target = "vox.session", "joining in-flight renewal");
				inflight.clone()
			} else {
				let inner = Arc::clone(&self.inner);
				let fut = async move {
					let outcome = renew_once(&inner).await;
					inner.renewal.lock().take();
					outcome
				}
				.boxed()
				.shared();
				*slot = Some(fut.clone());
				fut
			}
		};
		renewal.await
	}

	/// Persists the pair and makes it the gateway's current credential.
	fn install_pair(&self, pair: &CredentialPair) -> Result<()> {
		self.inner.store.save(pair)?;
		self.inner.gateway.set_token(&pair.access_token);
		Ok(())
	}

	fn discard_credentials(&self) {
		if let Err(err) = self.inner.store.clear() {
			warn!(target = "vox.session", error = %err, "credential store clear failed");
		}
		self.inner.gateway.clear_token();
	}

	fn set_status(&self, status: SessionStatus) {
		self.inner.state.write().status = status;
	}

	fn settle_authenticated(&self, user: User) {
		*self.inner.state.write() = SessionSnapshot {
			status: SessionStatus::Authenticated,
			user: Some(user),
		};
	}

	fn settle_unauthenticated(&self) {
		*self.inner.state.write() = SessionSnapshot {
			status: SessionStatus::Unauthenticated,
			user: None,
		};
	}
}

/// One refresh round-trip: exchange the stored refresh token for a rotated
/// pair, persist it, and install the new access credential.
async fn renew_once(inner: &SessionInner) -> Result<CredentialPair> {
	let Some(pair) = inner.store.load() else {
		// Nothing to renew with; treat like a rejected credential.
		return Err(Error::Auth);
	};

	let request = RefreshRequest {
		refresh_token: pair.refresh_token,
	};
	let token: TokenResponse = inner.gateway.post(REFRESH_PATH, &request).await?;

	let pair = CredentialPair::from(token);
	inner.store.save(&pair)?;
	inner.gateway.set_token(&pair.access_token);
	info!(target = "vox.session", "credentials renewed");
	Ok(pair)
}
