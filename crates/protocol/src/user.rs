//! Current-user snapshot as returned by `GET /api/v1/users/me`.

use serde::{Deserialize, Serialize};

/// Identity/profile snapshot fetched from the backend.
///
/// Treated as a value by the client: replaced wholesale on each fetch, never
/// partially patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
	pub id: String,
	pub email: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub full_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar_url: Option<String>,
	pub tier: String,
	pub credits_remaining: i64,
	#[serde(default)]
	pub email_verified: bool,
	#[serde(default)]
	pub is_active: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<String>,
}
