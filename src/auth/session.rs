use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::SessionClaims;
use crate::{config::JwtConfig, state::AppState};

/// HS256 signing and verification keys for session tokens.
///
/// Built once at startup from [`JwtConfig`]; rotating the secret invalidates
/// every token issued before the rotation.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl SessionKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::days(cfg.ttl_days),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid, username: &str) -> anyhow::Result<String> {
        self.issue_at(user_id, username, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        user_id: Uuid,
        username: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let claims = SessionClaims {
            sub: user_id,
            username: username.to_owned(),
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "session token signed");
        Ok(token)
    }

    /// Returns the claims of a genuine, unexpired token and `None` otherwise.
    pub fn validate(&self, token: &str) -> Option<SessionClaims> {
        self.validate_at(token, OffsetDateTime::now_utc())
    }

    pub fn validate_at(&self, token: &str, now: OffsetDateTime) -> Option<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against `now`, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = match decode::<SessionClaims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!(error = %e, "session token rejected");
                return None;
            }
        };

        if claims.exp <= now.unix_timestamp() {
            debug!(user_id = %claims.sub, "session token expired");
            return None;
        }
        Some(claims)
    }
}
