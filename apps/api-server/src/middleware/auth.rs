//! Bearer token extractors.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};

use quill_core::domain::Identity;
use quill_core::ports::{AuthError, IdentityProvider};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated caller. Rejects the request when no valid token is present:
/// ```ignore
/// async fn protected_route(actor: Actor) -> impl Responder {
///     format!("Hello, user {}!", actor.0.id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Actor(pub Identity);

/// Caller that may be anonymous. A present but invalid token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeActor(pub Option<Identity>);

impl IdentityProvider for Actor {
    fn current_identity(&self) -> Option<Identity> {
        Some(self.0.clone())
    }
}

impl IdentityProvider for MaybeActor {
    fn current_identity(&self) -> Option<Identity> {
        self.0.clone()
    }
}

fn bearer_identity(req: &HttpRequest) -> Result<Identity, AuthError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AuthError::InvalidToken("Server configuration error".to_string())
    })?;

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    let claims = state.tokens.validate_token(token)?;
    Ok(claims.identity())
}

impl FromRequest for Actor {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(bearer_identity(req).map(Actor).map_err(AppError::from))
    }
}

impl FromRequest for MaybeActor {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match bearer_identity(req) {
            Ok(identity) => ready(Ok(MaybeActor(Some(identity)))),
            Err(AuthError::MissingAuth) => ready(Ok(MaybeActor(None))),
            Err(e) => ready(Err(e.into())),
        }
    }
}
