//! Query helpers shared by the Diesel repositories.

use std::collections::BTreeSet;

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use pagination::PageRequest;
use uuid::Uuid;

use super::models::{UserNames, UserSummary};
use super::schema::users;

/// `LIMIT` and `OFFSET` for a validated page request.
pub(crate) fn page_window(page: &PageRequest) -> (i64, i64) {
    let limit = i64::from(page.limit());
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

/// Trimmed `raw` with `LIKE` wildcards escaped, for a whole-value `ILIKE`.
pub(crate) fn literal_pattern(raw: &str) -> String {
    let mut pattern = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern
}

/// Wrap `raw` for a case-insensitive substring `ILIKE`, escaping wildcards.
pub(crate) fn contains_pattern(raw: &str) -> String {
    format!("%{}%", literal_pattern(raw))
}

/// Load display names and roles for every referenced user in one query.
pub(crate) async fn load_user_names(
    conn: &mut AsyncPgConnection,
    ids: impl IntoIterator<Item = Uuid>,
) -> QueryResult<UserNames> {
    let ids: Vec<Uuid> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
    if ids.is_empty() {
        return Ok(UserNames::default());
    }
    let rows = users::table
        .filter(users::id.eq_any(ids))
        .select((users::id, users::name, users::role))
        .load::<UserSummary>(conn)
        .await?;
    Ok(UserNames::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("piano", "%piano%")]
    #[case("  cello ", "%cello%")]
    #[case("50%_off", "%50\\%\\_off%")]
    #[case("a\\b", "%a\\\\b%")]
    fn patterns_escape_like_wildcards(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(contains_pattern(raw), expected);
    }

    #[rstest]
    #[case(" Piano ", "Piano")]
    #[case("gu%tar", "gu\\%tar")]
    #[case("_", "\\_")]
    fn literal_patterns_match_only_the_value(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(literal_pattern(raw), expected);
    }

    #[rstest]
    fn page_window_converts_offsets() {
        let page = PageRequest::new(Some(3), Some(20)).expect("valid page");
        assert_eq!(page_window(&page), (20, 40));
    }
}
