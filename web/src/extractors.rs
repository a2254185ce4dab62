//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request's correlation ID
//! - [`Principal`]: the authenticated caller, as asserted by the gateway
//! - [`RequireAdmin`], [`RequireBuilder`], [`RequireBuyer`]: role guards
//!
//! Authentication happens upstream. The gateway forwards the caller's
//! identity in `X-Principal-Id` and `X-Principal-Role`; a request without
//! them is rejected with 401, and a request with the wrong role with 403.
//!
//! # Examples
//!
//! ```ignore
//! async fn book(
//!     RequireBuilder(builder_id): RequireBuilder,
//!     Path((event_id, stall_type_id)): Path<(i64, i64)>,
//! ) -> Result<Json<Stall>, AppError> {
//!     // builder_id comes from the principal headers, never the body
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use nativenest_core::types::{BuilderId, BuyerId};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Header carrying the caller's numeric identifier.
pub const PRINCIPAL_ID_HEADER: &str = "X-Principal-Id";

/// Header carrying the caller's role.
pub const PRINCIPAL_ROLE_HEADER: &str = "X-Principal-Role";

/// Correlation ID for request tracing.
///
/// Read from request extensions when the correlation middleware is
/// installed, otherwise from the `X-Correlation-ID` header, otherwise a
/// fresh UUID v4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Caller roles known to the stall booking API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Event administrator
    Admin,
    /// Stall builder (exhibitor)
    Builder,
    /// Buyer (visitor)
    Buyer,
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "builder" => Ok(Self::Builder),
            "buyer" => Ok(Self::Buyer),
            other => Err(AppError::unauthorized(format!("Unknown role: {other}"))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Admin => "admin",
            Self::Builder => "builder",
            Self::Buyer => "buyer",
        })
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// Identifier in the caller's own directory (builder, buyer or admin id)
    pub id: i64,
    /// Caller role
    pub role: Role,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?
        .to_str()
        .map_err(|_| AppError::unauthorized(format!("Malformed {name} header")))
}

impl Principal {
    fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let id = header(headers, PRINCIPAL_ID_HEADER)?
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::unauthorized(format!("Malformed {PRINCIPAL_ID_HEADER} header")))?;
        let role = header(headers, PRINCIPAL_ROLE_HEADER)?.parse()?;

        Ok(Self { id, role })
    }

    fn require(self, role: Role) -> Result<Self, AppError> {
        if self.role == role {
            Ok(self)
        } else {
            Err(AppError::forbidden(format!(
                "This action requires the {role} role"
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}

/// Guard: caller must be an admin.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Principal::from_headers(&parts.headers)?
            .require(Role::Admin)
            .map(Self)
    }
}

/// Guard: caller must be a builder; yields the builder's id.
#[derive(Debug, Clone, Copy)]
pub struct RequireBuilder(pub BuilderId);

#[async_trait]
impl<S> FromRequestParts<S> for RequireBuilder
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_headers(&parts.headers)?.require(Role::Builder)?;
        Ok(Self(BuilderId::new(principal.id)))
    }
}

/// Guard: caller must be a buyer; yields the buyer's id.
#[derive(Debug, Clone, Copy)]
pub struct RequireBuyer(pub BuyerId);

#[async_trait]
impl<S> FromRequestParts<S> for RequireBuyer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_headers(&parts.headers)?.require(Role::Buyer)?;
        Ok(Self(BuyerId::new(principal.id)))
    }
}
