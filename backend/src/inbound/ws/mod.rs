//! WebSocket inbound adapter for realtime room membership and pushes.
//!
//! The upgrade handler authenticates the caller, checks the Origin
//! allow-list, registers the connection with the gateway, and hands the
//! socket to a [`session`] task that runs until either side closes.

use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use serde::Deserialize;
use tracing::info;

use crate::domain::{AuthToken, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::bearer_token;

mod session;

pub mod messages;
pub mod origin;
pub mod state;

pub use origin::OriginPolicy;
pub use state::WsState;

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Prefer the `Authorization` header, falling back to `?token=`.
fn resolve_token(req: &HttpRequest) -> Result<AuthToken, Error> {
    if let Some(token) = bearer_token(req.headers())? {
        return Ok(token);
    }
    web::Query::<TokenQuery>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.into_inner().token)
        .filter(|token| !token.trim().is_empty())
        .map(|token| AuthToken::from_presented(token.trim()))
        .ok_or_else(|| Error::unauthorized("missing bearer token"))
}

/// Upgrade `GET /ws` to a realtime socket.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    req: HttpRequest,
    stream: Payload,
) -> ApiResult<HttpResponse> {
    state.origins.check(req.headers())?;
    let token = resolve_token(&req)?;
    let user = state.auth.authenticate(&token).await?;

    let (response, socket, messages) = actix_ws::handle(&req, stream)?;
    let (connection, events) = state.gateway.connect(&user);
    info!(%connection, user = %user.id, "socket connected");

    let session = session::WsSession::new(state.gateway.clone(), user, connection);
    actix_web::rt::spawn(session.run(socket, messages, events));
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::test::TestRequest;
    use rstest::rstest;

    #[rstest]
    #[case(TestRequest::default().insert_header((AUTHORIZATION, "Bearer abc")), "abc")]
    #[case(TestRequest::with_uri("/ws?token=xyz"), "xyz")]
    #[case(
        TestRequest::with_uri("/ws?token=query").insert_header((AUTHORIZATION, "Bearer header")),
        "header"
    )]
    fn token_sources(#[case] request: TestRequest, #[case] expected: &str) {
        let token = resolve_token(&request.to_http_request()).expect("token");
        assert_eq!(token.expose(), expected);
    }

    #[rstest]
    #[case(TestRequest::with_uri("/ws"))]
    #[case(TestRequest::with_uri("/ws?token=%20"))]
    fn missing_token_is_unauthorised(#[case] request: TestRequest) {
        let err = resolve_token(&request.to_http_request()).expect_err("no token");
        assert_eq!(err.code(), crate::domain::ErrorCode::Unauthorized);
    }
}
