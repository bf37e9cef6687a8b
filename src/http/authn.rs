//! Admin/public authorization surfaces.
//!
//! Admin and public sports endpoints are split at the route-group level
//! and gated by distinct collaborator traits, each with a permissive
//! default so the crate runs standalone — production wiring plugs in the
//! real `Authn` service from outside this subsystem.

use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub subject: String,
    pub is_superowner: bool,
}

#[derive(Debug, Clone)]
pub struct SubjectPrincipal {
    pub subject: String,
}

/// Verifies the bearer token on admin-only routes (`/sports/sources*`).
#[async_trait]
pub trait AdminAuthn: Send + Sync {
    async fn verify_admin(&self, headers: &HeaderMap) -> AppResult<AdminPrincipal>;
}

/// Verifies the bearer token on public routes, when a caller is present.
#[async_trait]
pub trait SubjectAuthn: Send + Sync {
    async fn verify_subject(&self, headers: &HeaderMap) -> AppResult<Option<SubjectPrincipal>>;
}

/// Default implementation used when this subsystem runs without the
/// platform's real authentication service wired in — every request is
/// treated as an authorized superowner / anonymous subject. Never use in
/// a deployment that actually needs to enforce auth.
pub struct NoopAuthn;

#[async_trait]
impl AdminAuthn for NoopAuthn {
    async fn verify_admin(&self, _headers: &HeaderMap) -> AppResult<AdminPrincipal> {
        Ok(AdminPrincipal {
            subject: "noop-admin".to_string(),
            is_superowner: true,
        })
    }
}

#[async_trait]
impl SubjectAuthn for NoopAuthn {
    async fn verify_subject(&self, _headers: &HeaderMap) -> AppResult<Option<SubjectPrincipal>> {
        Ok(None)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Header-presence-only stand-in used by tests that want to exercise the
/// admin/public split without standing up a real token verifier.
pub struct HeaderPresenceAuthn;

#[async_trait]
impl AdminAuthn for HeaderPresenceAuthn {
    async fn verify_admin(&self, headers: &HeaderMap) -> AppResult<AdminPrincipal> {
        match bearer_token(headers) {
            Some(token) if !token.is_empty() => Ok(AdminPrincipal {
                subject: token.to_string(),
                is_superowner: false,
            }),
            _ => Err(AppError::validation("missing or empty admin bearer token")),
        }
    }
}

#[async_trait]
impl SubjectAuthn for HeaderPresenceAuthn {
    async fn verify_subject(&self, headers: &HeaderMap) -> AppResult<Option<SubjectPrincipal>> {
        Ok(bearer_token(headers).map(|token| SubjectPrincipal {
            subject: token.to_string(),
        }))
    }
}
