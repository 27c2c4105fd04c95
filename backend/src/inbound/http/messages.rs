//! Direct messaging handlers.
//!
//! ```text
//! POST /api/messages                                   {"recipientId":"…","text":"…"}
//! GET  /api/messages/conversations
//! GET  /api/messages/conversations/{userId}?before=&limit=
//! POST /api/messages/conversations/{userId}/read
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ConversationSummary, Message};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerAuth;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    parse_optional_timestamp, parse_optional_u32, parse_user_id, required,
};

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub recipient_id: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConversationQuery {
    /// Only messages created strictly before this RFC 3339 instant.
    pub before: Option<String>,
    /// Page size, clamped to 1..=100; defaults to 50.
    pub limit: Option<String>,
}

/// Number of messages flipped to read.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadReceipt {
    pub count: u64,
}

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent"),
        (status = 400, description = "Invalid message", body = ErrorSchema),
        (status = 404, description = "No such recipient", body = ErrorSchema)
    ),
    tags = ["messages"],
    operation_id = "sendMessage"
)]
#[post("/messages")]
pub async fn send_message(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    payload: web::Json<SendMessageRequest>,
) -> ApiResult<HttpResponse> {
    let SendMessageRequest { recipient_id, text } = payload.into_inner();
    let recipient = parse_user_id(&required(recipient_id, "recipientId")?, "recipientId")?;
    let text = required(text, "text")?;
    let message = state.messages.send(auth.user(), &recipient, text).await?;
    Ok(HttpResponse::Created().json(message))
}

#[utoipa::path(
    get,
    path = "/api/messages/conversations",
    responses((status = 200, description = "One summary per counterpart, latest first")),
    tags = ["messages"],
    operation_id = "listConversations"
)]
#[get("/messages/conversations")]
pub async fn list_conversations(
    state: web::Data<HttpState>,
    auth: BearerAuth,
) -> ApiResult<web::Json<Vec<ConversationSummary>>> {
    Ok(web::Json(state.messages.conversations(auth.user()).await?))
}

#[utoipa::path(
    get,
    path = "/api/messages/conversations/{userId}",
    params(
        ("userId" = String, Path, description = "Counterpart id"),
        ConversationQuery
    ),
    responses(
        (status = 200, description = "Messages, newest first"),
        (status = 400, description = "Invalid cursor", body = ErrorSchema)
    ),
    tags = ["messages"],
    operation_id = "getConversation"
)]
#[get("/messages/conversations/{user_id}")]
pub async fn get_conversation(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
    query: web::Query<ConversationQuery>,
) -> ApiResult<web::Json<Vec<Message>>> {
    let other = parse_user_id(&path, "userId")?;
    let before = parse_optional_timestamp(query.before.as_deref(), "before")?;
    let limit = parse_optional_u32(query.limit.as_deref(), "limit")?;
    Ok(web::Json(
        state
            .messages
            .conversation(auth.user(), &other, before, limit)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/messages/conversations/{userId}/read",
    params(("userId" = String, Path, description = "Counterpart id")),
    responses((status = 200, description = "Messages marked read", body = ReadReceipt)),
    tags = ["messages"],
    operation_id = "markConversationRead"
)]
#[post("/messages/conversations/{user_id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
) -> ApiResult<web::Json<ReadReceipt>> {
    let other = parse_user_id(&path, "userId")?;
    let count = state.messages.mark_read(auth.user(), &other).await?;
    Ok(web::Json(ReadReceipt { count }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, UserId};
    use crate::inbound::http::test_utils::{TestPorts, api_app, bearer, json_body};
    use crate::test_support::{fixture_now, sample_user};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[actix_web::test]
    async fn send_message_returns_created() {
        let sender = sample_user(Role::Student, "Sam Student");
        let sender_id = sender.id;
        let recipient = UserId::random();
        let mut ports = TestPorts::signed_in(&sender);
        ports
            .messages
            .expect_send()
            .withf(move |_, to, text| *to == recipient && text == "See you Monday")
            .return_once(move |_, to, text| {
                Ok(Message::new(sender_id, *to, &text, fixture_now()).expect("valid message"))
            });
        let app = test::init_service(api_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/messages")
                .insert_header(bearer())
                .set_json(json!({ "recipientId": recipient.to_string(), "text": "See you Monday" }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["text"], "See you Monday");
    }

    #[rstest]
    #[case(json!({ "text": "hi" }), "recipientId")]
    #[case(json!({ "recipientId": "nope", "text": "hi" }), "recipientId")]
    #[case(json!({ "recipientId": "00000000-0000-4000-8000-000000000001" }), "text")]
    #[actix_web::test]
    async fn send_message_rejects_incomplete_bodies(
        #[case] body: serde_json::Value,
        #[case] field: &str,
    ) {
        let sender = sample_user(Role::Student, "Sam Student");
        let mut ports = TestPorts::signed_in(&sender);
        ports.messages.expect_send().times(0);
        let app = test::init_service(api_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/messages")
                .insert_header(bearer())
                .set_json(body)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], field);
    }

    #[rstest]
    #[actix_web::test]
    async fn conversation_passes_cursor_and_limit() {
        let user = sample_user(Role::Teacher, "Tia Teacher");
        let other = UserId::random();
        let mut ports = TestPorts::signed_in(&user);
        ports
            .messages
            .expect_conversation()
            .withf(move |_, with, before, limit| {
                *with == other && *before == Some(fixture_now()) && *limit == Some(20)
            })
            .return_once(|_, _, _, _| Ok(Vec::new()));
        let app = test::init_service(api_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!(
                    "/api/messages/conversations/{other}?before=2026-03-02T10:00:00Z&limit=20"
                ))
                .insert_header(bearer())
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[rstest]
    #[actix_web::test]
    async fn mark_read_reports_count() {
        let user = sample_user(Role::Student, "Sam Student");
        let mut ports = TestPorts::signed_in(&user);
        ports.messages.expect_mark_read().return_once(|_, _| Ok(4));
        let app = test::init_service(api_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/messages/conversations/{}/read", UserId::random()))
                .insert_header(bearer())
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "count": 4 }));
    }
}
