//! Correlation identifier carried by every request.
//!
//! The [`crate::Trace`] middleware puts a `TraceId` in task-local scope for
//! the lifetime of a request; error payloads and log spans read it from
//! there. Spawned tasks do not inherit the scope; wrap their futures with
//! [`TraceId::scope`] to keep correlation.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static CURRENT: TraceId;
}

/// UUID identifying one request across logs, errors, and the `trace-id`
/// response header.
///
/// # Examples
/// ```
/// use musiconthego::TraceId;
///
/// let id: TraceId = "4b0f5c7e-9d7a-4d4e-8a51-7f0e1c9b2a10".parse().expect("uuid");
/// assert_eq!(id.to_string(), "4b0f5c7e-9d7a-4d4e-8a51-7f0e1c9b2a10");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    #[must_use]
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Adopt a client-supplied identifier when it is a well-formed UUID.
    ///
    /// The nil UUID is refused so clients cannot collapse unrelated requests
    /// onto one identifier.
    #[must_use]
    pub fn from_header(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim())
            .ok()
            .filter(|uuid| !uuid.is_nil())
            .map(Self)
    }

    /// Identifier of the request currently being served, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Run `fut` with `trace_id` as the current identifier.
    pub async fn scope<Fut>(trace_id: Self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        CURRENT.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("4b0f5c7e-9d7a-4d4e-8a51-7f0e1c9b2a10", true)]
    #[case("  4b0f5c7e-9d7a-4d4e-8a51-7f0e1c9b2a10 ", true)]
    #[case("00000000-0000-0000-0000-000000000000", false)]
    #[case("req-42", false)]
    #[case("", false)]
    fn client_headers_are_adopted_only_when_usable(#[case] raw: &str, #[case] adopted: bool) {
        assert_eq!(TraceId::from_header(raw).is_some(), adopted);
    }

    #[tokio::test]
    async fn scope_sets_and_clears_current() {
        let id = TraceId::generate();
        assert_eq!(TraceId::scope(id, async { TraceId::current() }).await, Some(id));
        assert!(TraceId::current().is_none());
    }

    #[tokio::test]
    async fn nested_scopes_shadow_outer() {
        let outer = TraceId::generate();
        let inner = TraceId::generate();
        let seen = TraceId::scope(outer, async move {
            let nested = TraceId::scope(inner, async { TraceId::current() }).await;
            (nested, TraceId::current())
        })
        .await;
        assert_eq!(seen, (Some(inner), Some(outer)));
    }
}
