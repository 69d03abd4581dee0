//! # Authentication & Authorization
//!
//! Bearer JWT (HS256) validation with claim-based policies.
//!
//! ## Token Claims
//!
//! ```text
//! userid          UUID of the caller (required)
//! admin           true | "true"   grants Policy::Admin
//! trusted_member  true | "true"   grants Policy::TrustedMember
//! sub, email      informational
//! exp, iss, aud   checked by jsonwebtoken
//! ```
//!
//! ## Flow
//!
//! [`auth_middleware`] runs on every API request. A missing `Authorization`
//! header leaves the request anonymous; a present but invalid one is
//! rejected with 401. A valid token becomes a [`CallerIdentity`] in the
//! request extensions, which handlers extract directly (401 when absent)
//! or as `Option<CallerIdentity>` on public routes. [`require`] then checks
//! a [`Policy`] and answers 403 when the claim is missing.

use std::convert::Infallible;
use std::fmt;

use axum::extract::{FromRequestParts, OptionalFromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::headers::{self, Header};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::AppError;

// ── Claims ──────────────────────────────────────────────────────────────────

/// Claims read from a validated token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub userid: Option<String>,
    #[serde(default, deserialize_with = "claim_flag")]
    pub admin: bool,
    #[serde(default, deserialize_with = "claim_flag")]
    pub trusted_member: bool,
    pub exp: u64,
}

/// Identity services emit boolean claims either as JSON booleans or as the
/// string `"true"`.
fn claim_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Text(text) => text.eq_ignore_ascii_case("true"),
    })
}

// ── Policy ──────────────────────────────────────────────────────────────────

/// Authorization requirements attached to routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Any valid token.
    Authenticated,
    /// `trusted_member` or `admin` claim.
    TrustedMember,
    /// `admin` claim.
    Admin,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::TrustedMember => "trusted_member",
            Self::Admin => "admin",
        }
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// The authenticated caller, parsed from token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: Uuid,
    pub admin: bool,
    pub trusted_member: bool,
}

impl CallerIdentity {
    pub fn satisfies(&self, policy: Policy) -> bool {
        match policy {
            Policy::Authenticated => true,
            Policy::TrustedMember => self.admin || self.trusted_member,
            Policy::Admin => self.admin,
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("authentication required".into()))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for CallerIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CallerIdentity>().cloned())
    }
}

/// Check that the caller satisfies `policy`. Returns 403 otherwise.
pub fn require(caller: &CallerIdentity, policy: Policy) -> Result<(), AppError> {
    if caller.satisfies(policy) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "policy '{}' not satisfied",
            policy.as_str()
        )))
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Validates bearer tokens against the configured key, issuer and audience.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("key", &"[REDACTED]")
            .field("iss", &self.validation.iss)
            .field("aud", &self.validation.aud)
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match &config.issuer {
            Some(issuer) => validation.set_issuer(&[issuer]),
            None => validation.iss = None,
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        Self {
            key: DecodingKey::from_secret(config.key.as_bytes()),
            validation,
        }
    }

    /// Decode and validate `token`, then map its claims to a caller.
    pub fn verify(&self, token: &str) -> Result<CallerIdentity, String> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| format!("invalid bearer token: {e}"))?;
        let claims = data.claims;
        let user_id = claims
            .userid
            .as_deref()
            .ok_or("token has no userid claim")?
            .parse::<Uuid>()
            .map_err(|e| format!("invalid userid claim: {e}"))?;
        Ok(CallerIdentity {
            user_id,
            admin: claims.admin,
            trusted_member: claims.trusted_member,
        })
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Attach the caller identity when a bearer token is present.
///
/// Expects a [`JwtVerifier`] in the request extensions. Requests without an
/// `Authorization` header pass through anonymously.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let Some(verifier) = request.extensions().get::<JwtVerifier>().cloned() else {
        tracing::error!("auth middleware installed without a JwtVerifier extension");
        return AppError::Internal("authentication is not configured".into()).into_response();
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default().to_owned());

    match auth_header {
        None => next.run(request).await,
        Some(value) => match bearer_token(&value) {
            Some(token) => match verifier.verify(token.trim()) {
                Ok(identity) => {
                    request.extensions_mut().insert(identity);
                    next.run(request).await
                }
                Err(msg) => {
                    tracing::warn!(reason = %msg, "authentication failed");
                    AppError::Unauthorized(msg).into_response()
                }
            },
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                AppError::Unauthorized("authorization header must use Bearer scheme".into())
                    .into_response()
            }
        },
    }
}

/// Token after a `Bearer` scheme, matched case-insensitively (RFC 7235).
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}

// ── API Key ─────────────────────────────────────────────────────────────────

static X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

/// The `x-api-key` request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XApiKey(pub String);

impl Header for XApiKey {
    fn name() -> &'static HeaderName {
        &X_API_KEY
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        value
            .to_str()
            .map(|s| Self(s.to_owned()))
            .map_err(|_| headers::Error::invalid())
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        if let Ok(value) = HeaderValue::from_str(&self.0) {
            values.extend(std::iter::once(value));
        }
    }
}

/// Configured API key for write endpoints. Custom `Debug` redacts it.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// 401 unless `provided` matches the configured key.
    pub fn check(&self, provided: Option<&XApiKey>) -> Result<(), AppError> {
        match provided {
            Some(XApiKey(key)) if constant_time_eq(key, &self.0) => Ok(()),
            Some(_) => Err(AppError::Unauthorized("invalid API key".into())),
            None => Err(AppError::Unauthorized("missing x-api-key header".into())),
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Constant-time comparison. Unequal lengths still perform a comparison.
fn constant_time_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}
