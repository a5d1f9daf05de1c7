//! # Search Tokens
//!
//! Search criteria are carried in a query parameter as an HS256-signed JWT.
//! The criteria sit in a `data` claim next to `iat` and an optional `exp`,
//! so any JSON value (not only objects) round-trips.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{TokenError, TokenResult};

#[derive(Debug, Serialize, Deserialize)]
struct SearchClaims {
    data: Value,
    iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

/// Signs and verifies search tokens with a shared key
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Option<Duration>,
}

impl TokenCodec {
    /// Tokens that never expire
    pub fn new(key: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            ttl: None,
        }
    }

    /// Tokens that expire `ttl` after being issued
    pub fn with_ttl(key: &str, ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::new(key)
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn encode(&self, data: &Value) -> TokenResult<String> {
        let now = Utc::now();
        let exp = match self.ttl {
            Some(ttl) => {
                let expires = now.checked_add_signed(ttl).ok_or_else(|| {
                    TokenError::Encoding(format!("expiry {} from now is out of range", ttl))
                })?;
                Some(expires.timestamp())
            }
            None => None,
        };
        let claims = SearchClaims {
            data: data.clone(),
            iat: now.timestamp(),
            exp,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> TokenResult<Value> {
        let mut validation = Validation::new(Algorithm::HS256);
        match self.ttl {
            Some(_) => {
                validation.leeway = 0;
            }
            None => {
                validation.validate_exp = false;
                validation.required_spec_claims.clear();
            }
        }

        let token_data =
            jsonwebtoken::decode::<SearchClaims>(token, &self.decoding_key, &validation).map_err(
                |e| match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                    _ => TokenError::Malformed(e.to_string()),
                },
            )?;

        Ok(token_data.claims.data)
    }
}

/// Sign `data` with `key`, without expiry
pub fn encode(data: &Value, key: &str) -> TokenResult<String> {
    TokenCodec::new(key).encode(data)
}

/// Verify a token signed with `key` and return its data
pub fn decode(token: &str, key: &str) -> TokenResult<Value> {
    TokenCodec::new(key).decode(token)
}
