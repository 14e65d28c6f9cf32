use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scope tag carried by every token issued for authentication.
pub const AUTH_SCOPE: &str = "auth";

/// JWT payload binding a token to its owner and scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,      // owning user ID
    pub access: String, // scope tag
    pub iat: usize,     // issued at (unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>, // only present when a TTL is configured
    pub iss: String,
    pub aud: String,
}
