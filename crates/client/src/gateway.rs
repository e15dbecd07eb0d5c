//! Outbound HTTP calls with credential injection and failure classification.
//!
//! The gateway performs one call at a time and never recovers from failures
//! itself: it classifies them into the [`Error`] taxonomy and returns them.
//! Reacting to [`Error::Auth`] is reserved for the session manager.

use parking_lot::RwLock;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Gateway for one backend; owns the current access credential.
///
/// The token slot is written only by the session manager; every other
/// component treats it as read-only. Calls are plain futures: dropping one
/// (for example inside `tokio::select!`) aborts the in-flight request, which
/// is the cancellation contract callers rely on.
pub struct ApiGateway {
	http: reqwest::Client,
	base_url: Url,
	token: RwLock<Option<String>>,
}

impl ApiGateway {
	pub fn new(base_url: Url) -> Self {
		Self {
			http: reqwest::Client::new(),
			base_url,
			token: RwLock::new(None),
		}
	}

	/// Sets the access credential attached to subsequent calls.
	pub fn set_token(&self, token: impl Into<String>) {
		*self.token.write() = Some(token.into());
	}

	/// Drops the access credential; subsequent calls go out anonymous.
	pub fn clear_token(&self) {
		*self.token.write() = None;
	}

	pub fn has_token(&self) -> bool {
		self.token.read().is_some()
	}

	pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
		self.call(Method::GET, path, None::<&()>).await
	}

	pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
		self.call(Method::POST, path, Some(body)).await
	}

	pub async fn delete(&self, path: &str) -> Result<()> {
		let response = self.send(Method::DELETE, path, None::<&()>).await?;
		let status = response.status();
		if status.is_success() {
			return Ok(());
		}
		Err(classify(status, response).await)
	}

	/// Performs one call and deserializes the response body.
	///
	/// Attaches `Authorization: Bearer <token>` when a credential is set and
	/// omits the header otherwise. No retries, no implicit timeout beyond
	/// the transport default.
	pub async fn call<T: DeserializeOwned, B: Serialize + ?Sized>(
		&self,
		method: Method,
		path: &str,
		body: Option<&B>,
	) -> Result<T> {
		let response = self.send(method, path, body).await?;
		let status = response.status();
		if !status.is_success() {
			return Err(classify(status, response).await);
		}
		response
			.json::<T>()
			.await
			.map_err(|err| Error::Protocol(format!("invalid response body: {err}")))
	}

	async fn send<B: Serialize + ?Sized>(
		&self,
		method: Method,
		path: &str,
		body: Option<&B>,
	) -> Result<reqwest::Response> {
		let url = self
			.base_url
			.join(path)
			.map_err(|err| Error::Protocol(format!("invalid endpoint {path:?}: {err}")))?;
		debug!(target = "vox.gateway", %method, path, "request");

		let mut request = self.http.request(method, url);
		if let Some(token) = self.token.read().clone() {
			request = request.bearer_auth(token);
		}
		if let Some(body) = body {
			request = request.json(body);
		}

		request
			.send()
			.await
			.map_err(|err| Error::Network(err.to_string()))
	}
}

/// Maps a non-success response onto the error taxonomy.
async fn classify(status: StatusCode, response: reqwest::Response) -> Error {
	if status == StatusCode::UNAUTHORIZED {
		return Error::Auth;
	}
	if status.is_client_error() {
		// The backend reports machine messages as either `message` or
		// `detail` depending on the endpoint.
		let message = response
			.json::<Value>()
			.await
			.ok()
			.and_then(|body| {
				body.get("message")
					.or_else(|| body.get("detail"))
					.and_then(Value::as_str)
					.map(String::from)
			})
			.unwrap_or_else(|| "request failed".to_string());
		return Error::Client {
			status: status.as_u16(),
			message,
		};
	}
	Error::Server {
		status: status.as_u16(),
	}
}
