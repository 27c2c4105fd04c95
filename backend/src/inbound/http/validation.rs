//! Shared validation helpers for inbound HTTP adapters.
//!
//! Path segments and query values arrive as strings and are parsed here so
//! every malformed value produces the same `{field, value, code}` details.

use std::str::FromStr;

use actix_web::{HttpRequest, error::JsonPayloadError, web};
use chrono::{DateTime, NaiveDate, Utc};
use pagination::{PageError, PageRequest};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::domain::{Error, UserId, parse_date};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidTimestamp,
    InvalidNumber,
    InvalidValue,
    OutOfRange,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidNumber => "invalid_number",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::OutOfRange => "out_of_range",
        }
    }
}

fn field_error(field: &str, code: ErrorCode, message: String, value: Option<&str>) -> Error {
    let details = match value {
        Some(value) => json!({ "field": field, "value": value, "code": code.as_str() }),
        None => json!({ "field": field, "code": code.as_str() }),
    };
    Error::invalid_request(message).with_details(details)
}

/// 400 with `{field, code: "missing"}` details.
pub(crate) fn missing_field_error(field: &str) -> Error {
    field_error(
        field,
        ErrorCode::MissingField,
        format!("missing required field: {field}"),
        None,
    )
}

/// Unwrap a required body field.
pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Parse a UUID path or body value named `field`.
pub(crate) fn parse_uuid(value: &str, field: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(value.trim()).map_err(|_| {
        field_error(
            field,
            ErrorCode::InvalidUuid,
            format!("{field} must be a valid UUID"),
            Some(value),
        )
    })
}

pub(crate) fn parse_user_id(value: &str, field: &str) -> Result<UserId, Error> {
    parse_uuid(value, field).map(UserId::from_uuid)
}

/// Parse every entry, failing on the first bad id.
pub(crate) fn parse_user_ids(values: &[String], field: &str) -> Result<Vec<UserId>, Error> {
    values
        .iter()
        .map(|value| parse_user_id(value, field))
        .collect()
}

pub(crate) fn parse_optional_timestamp(
    value: Option<&str>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|timestamp| timestamp.with_timezone(&Utc))
                .map_err(|_| {
                    field_error(
                        field,
                        ErrorCode::InvalidTimestamp,
                        format!("{field} must be an RFC 3339 timestamp"),
                        Some(raw),
                    )
                })
        })
        .transpose()
}

pub(crate) fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, Error> {
    value.map(parse_date).transpose().map_err(Error::from)
}

pub(crate) fn parse_optional_u32(value: Option<&str>, field: &str) -> Result<Option<u32>, Error> {
    value
        .map(|raw| {
            raw.trim().parse::<u32>().map_err(|_| {
                field_error(
                    field,
                    ErrorCode::InvalidNumber,
                    format!("{field} must be a non-negative integer"),
                    Some(raw),
                )
            })
        })
        .transpose()
}

/// Parse an optional enum-like query value through its `FromStr`.
pub(crate) fn parse_optional<T: FromStr>(value: Option<&str>, field: &str) -> Result<Option<T>, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| {
            raw.parse::<T>().map_err(|_| {
                field_error(
                    field,
                    ErrorCode::InvalidValue,
                    format!("{field} has an unsupported value"),
                    Some(raw),
                )
            })
        })
        .transpose()
}

/// `page` and `limit` query parameters shared by list endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// One-based page number (default 1).
    pub page: Option<String>,
    /// Page size (default 20, at most 100).
    pub limit: Option<String>,
}

impl PageQuery {
    pub(crate) fn to_request(&self) -> Result<PageRequest, Error> {
        let page = parse_optional_u32(self.page.as_deref(), "page")?;
        let limit = parse_optional_u32(self.limit.as_deref(), "limit")?;
        PageRequest::new(page, limit).map_err(|err| {
            let field = match err {
                PageError::PageOutOfRange => "page",
                PageError::LimitOutOfRange { .. } => "limit",
            };
            field_error(field, ErrorCode::OutOfRange, err.to_string(), None)
        })
    }
}

/// Render malformed JSON bodies with the shared error payload.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let error = match &err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            Error::payload_too_large("request body is too large")
        }
        other => Error::invalid_request(format!("malformed JSON body: {other}")),
    };
    error.into()
}

/// JSON extractor configuration using [`json_error_handler`].
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error_handler)
}
