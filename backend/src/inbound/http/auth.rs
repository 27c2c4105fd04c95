//! Bearer-token authentication for HTTP handlers.
//!
//! Handlers take a [`BearerAuth`] argument; the extractor resolves the token
//! through [`crate::domain::ports::AuthService`] before the handler body runs.

use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{AuthToken, AuthenticatedUser, Error, Role};
use crate::inbound::http::state::HttpState;

const BEARER_PREFIX: &str = "bearer ";

/// Extract the token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<Option<AuthToken>, Error> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header is not valid text"))?;
    let scheme = raw.get(..BEARER_PREFIX.len()).unwrap_or_default();
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return Err(Error::unauthorized("authorization header must use the Bearer scheme"));
    }
    let token = raw[BEARER_PREFIX.len()..].trim();
    if token.is_empty() {
        return Err(Error::unauthorized("bearer token is empty"));
    }
    Ok(Some(AuthToken::from_presented(token)))
}

/// Authenticated caller resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    user: AuthenticatedUser,
    token: AuthToken,
}

impl BearerAuth {
    /// The caller the token resolved to.
    pub fn user(&self) -> &AuthenticatedUser {
        &self.user
    }

    /// Token as presented, for logout.
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Return the caller when they hold one of `roles`, otherwise `403`.
    pub fn require(&self, roles: &[Role]) -> Result<&AuthenticatedUser, Error> {
        self.user.require_role(roles)?;
        Ok(&self.user)
    }
}

impl FromRequest for BearerAuth {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req.headers());
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let token = token?.ok_or_else(|| Error::unauthorized("missing bearer token"))?;
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not registered with the app"))?;
            let user = state.auth.authenticate(&token).await?;
            Ok(Self { user, token })
        })
    }
}
