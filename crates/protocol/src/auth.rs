//! Credential issuance and renewal exchange bodies.

use serde::{Deserialize, Serialize};

/// Access/refresh token pair as held by the client.
///
/// Persisted as a single document so the two tokens can only exist together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
	pub access_token: String,
	pub refresh_token: String,
}

/// Body for `POST /api/v1/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

/// Body for `POST /api/v1/auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
	pub refresh_token: String,
}

/// Token issuance response shared by login and refresh.
///
/// The refresh token is rotated on every issuance, so both fields are always
/// present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
	pub access_token: String,
	pub refresh_token: String,
	#[serde(default = "default_token_type")]
	pub token_type: String,
}

fn default_token_type() -> String {
	"bearer".to_string()
}

impl From<TokenResponse> for CredentialPair {
	fn from(token: TokenResponse) -> Self {
		Self {
			access_token: token.access_token,
			refresh_token: token.refresh_token,
		}
	}
}
