// ABOUTME: JWT verification against the identity authority's published keys
// ABOUTME: Fetches JWKS once, then checks signature, token type, issuer, and expiry

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AuthError, AuthResult};

/// Only access tokens may call the API; refresh tokens are rejected
pub const ACCESS_TOKEN_TYPE: &str = "access";

const SUPPORTED_ALGORITHMS: &[Algorithm] = &[Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// One key from a JWKS document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(default)]
    pub kid: Option<String>,
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// Decoding keys indexed by key id
#[derive(Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, DecodingKey>,
}

impl KeySet {
    /// Keep the RSA keys that carry a key id; anything else is skipped
    pub fn from_jwks(jwks: &JwkSet) -> AuthResult<Self> {
        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            if jwk.kty != "RSA" {
                debug!(kty = %jwk.kty, "Skipping non-RSA key");
                continue;
            }
            let (Some(kid), Some(n), Some(e)) = (&jwk.kid, &jwk.n, &jwk.e) else {
                warn!("Skipping RSA key without kid or components");
                continue;
            };

            let key = DecodingKey::from_rsa_components(n, e)
                .map_err(|e| AuthError::Jwks(format!("invalid RSA key {}: {}", kid, e)))?;
            keys.insert(kid.clone(), key);
        }
        Ok(Self { keys })
    }

    pub fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key ids in sorted order
    pub fn key_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

// DecodingKey has no useful Debug output, so only the ids are shown
impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.key_ids()).finish()
    }
}

/// Download the JWKS document from `url`
pub async fn fetch_jwks(client: &Client, url: &str) -> AuthResult<JwkSet> {
    debug!("Fetching JWKS from {}", url);

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        return Err(AuthError::Jwks(format!(
            "JWKS request failed with status {}",
            status
        )));
    }

    let jwks: JwkSet = response
        .json()
        .await
        .map_err(|e| AuthError::Jwks(format!("Failed to parse JWKS: {}", e)))?;

    info!(keys = jwks.keys.len(), "Fetched JWKS");
    Ok(jwks)
}

/// Claims read from an access token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl Claims {
    /// The caller's user id: `uid` when present, otherwise `sub`
    pub fn user_id(&self) -> AuthResult<&str> {
        [self.uid.as_deref(), self.sub.as_deref()]
            .into_iter()
            .flatten()
            .find(|id| !id.is_empty())
            .ok_or(AuthError::MissingUserId)
    }
}

/// Verifies access tokens with a fixed key set loaded at startup
#[derive(Clone)]
pub struct JwtVerifier {
    keys: Arc<KeySet>,
    expected_issuer: String,
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("keys", &self.keys)
            .field("expected_issuer", &self.expected_issuer)
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(keys: KeySet, expected_issuer: impl Into<String>) -> Self {
        Self {
            keys: Arc::new(keys),
            expected_issuer: expected_issuer.into(),
        }
    }

    /// Verify the signature, then token type, issuer, and expiry, in that order
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if !SUPPORTED_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::InvalidToken(format!(
                "unexpected signing method: {:?}",
                header.alg
            )));
        }

        let kid = header.kid.ok_or(AuthError::UnknownKey)?;
        let key = self.keys.get(&kid).ok_or(AuthError::UnknownKey)?;

        // Claim checks below need distinct errors, so the library only checks the signature
        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let claims = decode::<Claims>(token, key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        if claims.typ.as_deref() != Some(ACCESS_TOKEN_TYPE) {
            return Err(AuthError::InvalidTokenType);
        }
        if claims.iss.as_deref() != Some(self.expected_issuer.as_str()) {
            return Err(AuthError::InvalidIssuer);
        }
        if claims.exp.is_some_and(|exp| exp <= Utc::now().timestamp()) {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}
