// faultline-gateway/src/auth.rs
// ============================================================================
// Module: Gateway Authentication
// Description: JWT verification for the API surface and the internal
//              shared-secret gate.
// Purpose: Provide fail-closed caller identity for JWT routes.
// Dependencies: jsonwebtoken, subtle, faultline-core
// ============================================================================

//! ## Overview
//! The API surface is gated by HS256 bearer tokens carrying `sub`,
//! `tenant_id`, and expiry claims; verification checks signature and expiry
//! and yields the authenticated user. Internal endpoints instead expect the
//! shared service secret compared in constant time, so internal handlers can
//! refuse direct exposure. All decisions fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use faultline_core::Actor;
use faultline_core::TenantId;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;
use subtle::ConstantTimeEq;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the internal service secret.
pub const INTERNAL_SECRET_HEADER: &str = "x-internal-service-key";

// ============================================================================
// SECTION: Claims
// ============================================================================

/// JWT claims minted and verified by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user identifier.
    pub sub: String,
    /// Tenant the user belongs to.
    pub tenant_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Expiry as unix seconds.
    pub exp: i64,
    /// Issued-at as unix seconds.
    pub iat: i64,
}

/// Authenticated user resolved from a verified token.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    /// User identifier.
    pub user_id: String,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl AuthedUser {
    /// Converts the user into an activity actor.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: Some(self.user_id.clone()),
            user_name: if self.name.is_empty() { self.user_id.clone() } else { self.name.clone() },
            user_email: self.email.clone(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or malformed authorization header.
    #[error("not authenticated")]
    Missing,
    /// Token failed signature or expiry validation.
    #[error("invalid or expired token")]
    Invalid,
    /// Tenant claim did not match the asserted tenant.
    #[error("tenant mismatch")]
    TenantMismatch,
}

// ============================================================================
// SECTION: JWT Keys
// ============================================================================

/// HS256 signing and verification keys.
#[derive(Clone)]
pub struct JwtKeys {
    /// Encoding key for minted tokens.
    encoding: EncodingKey,
    /// Decoding key for verification.
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Derives both keys from the configured secret.
    #[must_use]
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mints a token for the claims.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Invalid`] when encoding fails.
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::default(), claims, &self.encoding)
            .map_err(|_| AuthError::Invalid)
    }

    /// Verifies a token's signature and expiry, returning its claims.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Invalid`] when validation fails.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::default();
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::Invalid)
    }

    /// Verifies a token and checks the tenant claim against an asserted
    /// tenant, as the realtime handshake requires.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when validation or the tenant check fails.
    pub fn verify_for_tenant(
        &self,
        token: &str,
        claimed_tenant: &str,
    ) -> Result<AuthedUser, AuthError> {
        let claims = self.verify(token)?;
        if claims.tenant_id != claimed_tenant {
            return Err(AuthError::TenantMismatch);
        }
        Ok(user_from_claims(claims))
    }

    /// Authenticates a bearer header, returning the user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the header is missing or the token fails
    /// validation.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthedUser, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::Missing)?;
        let claims = self.verify(&token)?;
        Ok(user_from_claims(claims))
    }
}

/// Builds the authed user from verified claims.
fn user_from_claims(claims: Claims) -> AuthedUser {
    AuthedUser {
        user_id: claims.sub,
        tenant_id: TenantId::new(claims.tenant_id),
        name: claims.name,
        email: claims.email,
    }
}

/// Extracts a bearer token from the authorization header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next()?;
    let token = parts.next()?.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

// ============================================================================
// SECTION: Internal Secret
// ============================================================================

/// Verifies the internal shared-secret header in constant time.
///
/// An empty configured secret fails closed: no caller is internal.
#[must_use]
pub fn verify_internal_secret(headers: &HeaderMap, configured: &str) -> bool {
    if configured.is_empty() {
        return false;
    }
    let Some(presented) = headers.get(INTERNAL_SECRET_HEADER).and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    presented.as_bytes().ct_eq(configured.as_bytes()).into()
}
