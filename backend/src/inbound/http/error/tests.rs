//! Status mapping, redaction, and payload shape of error responses.

use super::*;
use actix_web::body::to_bytes;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "4b0f5c7e-9d7a-4d4e-8a51-7f0e1c9b2a10";

#[fixture]
fn duplicate_email() -> Error {
    Error::conflict("email already registered")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"field": "email", "code": "duplicate_email"}))
}

/// Render `error` and return the status, the echoed header, and the body.
async fn render(error: &Error) -> (StatusCode, Option<String>, Error) {
    let response = error.error_response();
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .map(|value| value.to_str().expect("ascii header").to_owned());
    let bytes = to_bytes(response.into_body())
        .await
        .expect("body is readable");
    let body = serde_json::from_slice(&bytes).expect("body is an Error payload");
    (status, header, body)
}

#[rstest]
#[case(ErrorCode::InvalidRequest, StatusCode::BAD_REQUEST)]
#[case(ErrorCode::Unauthorized, StatusCode::UNAUTHORIZED)]
#[case(ErrorCode::Forbidden, StatusCode::FORBIDDEN)]
#[case(ErrorCode::NotFound, StatusCode::NOT_FOUND)]
#[case(ErrorCode::Conflict, StatusCode::CONFLICT)]
#[case(ErrorCode::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE)]
#[case(ErrorCode::ServiceUnavailable, StatusCode::SERVICE_UNAVAILABLE)]
#[case(ErrorCode::InternalError, StatusCode::INTERNAL_SERVER_ERROR)]
fn every_code_has_a_status(#[case] code: ErrorCode, #[case] status: StatusCode) {
    assert_eq!(Error::new(code, "x").status_code(), status);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_hide_message_and_details() {
    let error = Error::internal("pool exploded: password=hunter2")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"sql": "select 1"}));

    let (status, header, body) = render(&error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(body.message(), "Internal server error");
    assert_eq!(body.trace_id(), Some(TRACE_ID));
    assert!(body.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn client_errors_pass_through(duplicate_email: Error) {
    let (status, header, body) = render(&duplicate_email).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(body, duplicate_email);
}

#[rstest]
#[actix_web::test]
async fn untraced_errors_send_no_header() {
    let (_, header, body) = render(&Error::not_found("booking not found")).await;
    assert!(header.is_none());
    assert!(body.trace_id().is_none());
}

#[rstest]
fn conflict_payload_snapshot(duplicate_email: Error) {
    insta::assert_json_snapshot!(duplicate_email, @r#"
    {
      "code": "conflict",
      "message": "email already registered",
      "traceId": "4b0f5c7e-9d7a-4d4e-8a51-7f0e1c9b2a10",
      "details": {
        "code": "duplicate_email",
        "field": "email"
      }
    }
    "#);
}

#[rstest]
fn actix_errors_become_opaque_internal_errors() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert!(err.details().is_none());
}
