//! Origin allow-list for WebSocket upgrades.

use actix_web::http::header::{HeaderMap, ORIGIN};
use tracing::warn;
use url::{Origin, Url};

use crate::domain::Error;

/// Parsed allow-list of `scheme://host[:port]` origins.
///
/// An empty list accepts every origin. Requests without an `Origin` header
/// (native clients) are always accepted.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<Origin>,
}

impl OriginPolicy {
    /// Parse configured origins.
    ///
    /// # Errors
    /// Returns the first entry that is not an absolute URL.
    pub fn new<I, S>(origins: I) -> Result<Self, url::ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = origins
            .into_iter()
            .map(|raw| Url::parse(raw.as_ref().trim()).map(|url| url.origin()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { allowed })
    }

    /// True when no allow-list is configured.
    pub fn is_open(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Check the `Origin` header of an upgrade request.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), Error> {
        let mut values = headers.get_all(ORIGIN);
        let Some(value) = values.next() else {
            return Ok(());
        };
        if values.next().is_some() {
            return Err(Error::invalid_request("multiple Origin headers"));
        }
        let raw = value
            .to_str()
            .map_err(|_| Error::invalid_request("Origin header is not valid text"))?;
        let origin = Url::parse(raw)
            .map_err(|_| Error::invalid_request("Origin header is not a URL"))?
            .origin();
        if self.is_open() || self.allowed.contains(&origin) {
            Ok(())
        } else {
            warn!(origin = raw, "rejected socket upgrade from disallowed origin");
            Err(Error::forbidden("origin not allowed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn policy() -> OriginPolicy {
        OriginPolicy::new(["http://localhost:5173", "https://app.musiconthego.example"])
            .expect("valid origins")
    }

    fn headers(origin: &[u8]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ORIGIN,
            HeaderValue::from_bytes(origin).expect("opaque header value"),
        );
        headers
    }

    #[rstest]
    #[case(b"http://localhost:5173".as_slice())]
    #[case(b"https://app.musiconthego.example".as_slice())]
    #[case(b"https://app.musiconthego.example:443".as_slice())]
    fn accepts_listed_origins(#[case] origin: &[u8]) {
        assert!(policy().check(&headers(origin)).is_ok());
    }

    #[rstest]
    #[case(b"http://localhost:3000".as_slice(), ErrorCode::Forbidden)]
    #[case(b"http://app.musiconthego.example".as_slice(), ErrorCode::Forbidden)]
    #[case(b"https://evil.example".as_slice(), ErrorCode::Forbidden)]
    #[case(b"not a url".as_slice(), ErrorCode::InvalidRequest)]
    #[case(&[0x80], ErrorCode::InvalidRequest)]
    fn rejects_other_origins(#[case] origin: &[u8], #[case] code: ErrorCode) {
        let err = policy().check(&headers(origin)).expect_err("rejected");
        assert_eq!(err.code(), code);
    }

    #[rstest]
    fn missing_origin_is_accepted() {
        assert!(policy().check(&HeaderMap::new()).is_ok());
    }

    #[rstest]
    fn empty_policy_accepts_everything() {
        let open = OriginPolicy::default();
        assert!(open.is_open());
        assert!(open.check(&headers(b"https://anywhere.example")).is_ok());
    }

    #[rstest]
    fn rejects_unparsable_configuration() {
        assert!(OriginPolicy::new(["localhost"]).is_err());
    }
}
