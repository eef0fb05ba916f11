use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity carried inside a session token. Never persisted server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,        // user ID
    pub username: String, // display name at issue time
    pub iat: i64,         // issued at (unix timestamp)
    pub exp: i64,         // expires at (unix timestamp)
}
