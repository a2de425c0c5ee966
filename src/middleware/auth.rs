//! Authentication middleware
//!
//! Callers identify themselves with an `identification: username:password`
//! header on every request. There are no sessions or tokens.

use std::collections::BTreeMap;

use axum::{
    extract::{State, Request},
    middleware::Next,
    response::Response,
    http::HeaderMap,
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::{AppState, AppError};
use crate::models::{Rights, UserRecord};

pub const IDENTIFICATION_HEADER: &str = "identification";

/// Credentials supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    pub username: String,
    pub password: String,
}

impl Identification {
    /// Split `username:password` on the first colon
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let (username, password) = raw
            .split_once(':')
            .ok_or(AppError::MalformedIdentification)?;

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let raw = headers
            .get(IDENTIFICATION_HEADER)
            .ok_or(AppError::MalformedIdentification)?
            .to_str()
            .map_err(|_| AppError::MalformedIdentification)?;

        Self::parse(raw)
    }
}

/// Password comparison strategy
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, stored: &str, supplied: &str) -> bool;
}

/// Exact, case-sensitive comparison of stored and supplied passwords
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextVerifier;

impl CredentialVerifier for PlaintextVerifier {
    fn verify(&self, stored: &str, supplied: &str) -> bool {
        stored == supplied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// Account lacks administrator rights
    Forbidden,
    /// Unknown user or wrong password
    Unauthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Allowed { rights: i64 },
    Denied(DenialReason),
}

impl From<DenialReason> for AppError {
    fn from(reason: DenialReason) -> Self {
        match reason {
            DenialReason::Forbidden => AppError::Forbidden,
            DenialReason::Unauthorized => AppError::InvalidCredentials,
        }
    }
}

/// Decide whether `identification` may perform an operation needing `required`.
///
/// Admin-gated operations check the rights flag before the password.
pub fn authorize(
    users: &BTreeMap<String, UserRecord>,
    identification: &Identification,
    required: Rights,
    verifier: &dyn CredentialVerifier,
) -> Authorization {
    let Some(record) = users.get(&identification.username) else {
        return Authorization::Denied(DenialReason::Unauthorized);
    };

    if required == Rights::Admin && record.rights != Rights::Admin.as_flag() {
        return Authorization::Denied(DenialReason::Forbidden);
    }

    if !verifier.verify(&record.password, &identification.password) {
        return Authorization::Denied(DenialReason::Unauthorized);
    }

    Authorization::Allowed { rights: record.rights }
}

/// Authenticated caller, inserted into request extensions by the middleware
#[derive(Debug, Clone)]
pub struct UserContext {
    pub username: String,
    pub rights: i64,
}

impl UserContext {
    pub fn is_admin(&self) -> bool {
        self.rights == Rights::Admin.as_flag()
    }
}

/// Middleware: any registered user with a valid password
pub async fn require_user(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(&state, req, next, Rights::Standard).await
}

/// Middleware: administrator with a valid password
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(&state, req, next, Rights::Admin).await
}

async fn authenticate(
    state: &AppState,
    mut req: Request,
    next: Next,
    required: Rights,
) -> Result<Response, AppError> {
    let identification = Identification::from_headers(req.headers())?;

    let decision = state
        .store
        .with_users(|users| authorize(users, &identification, required, state.verifier.as_ref()))
        .await;

    let rights = match decision {
        Authorization::Allowed { rights } => rights,
        Authorization::Denied(reason) => {
            tracing::warn!(
                "Denied {} {} for '{}': {:?}",
                req.method(), req.uri().path(), identification.username, reason
            );
            return Err(reason.into());
        }
    };

    req.extensions_mut().insert(UserContext {
        username: identification.username,
        rights,
    });

    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions
            .get::<UserContext>()
            .cloned()
            .ok_or(AppError::InvalidCredentials)
    }
}
