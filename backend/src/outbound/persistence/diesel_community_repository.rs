//! PostgreSQL-backed `CommunityRepository`.
//!
//! Like and comment counts are aggregated per page with two grouped queries
//! rather than stored on the post row, so they never drift from the
//! `post_likes` and `post_comments` tables.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use pagination::PageRequest;
use uuid::Uuid;

use crate::domain::ports::{CommunityRepository, CommunityRepositoryError};
use crate::domain::{Comment, CommunityPost, LikeState, PostQuery, UserId};

use super::diesel_basic_error_mapping::basic_error_mapping;
use super::diesel_helpers::{literal_pattern, load_user_names, page_window};
use super::models::{CommentRow, CommunityPostRow, PostCounters, from_db_count};
use super::pool::DbPool;
use super::schema::{community_posts, post_comments, post_likes};

basic_error_mapping!(CommunityRepositoryError);

/// Diesel-backed implementation of the [`CommunityRepository`] port.
#[derive(Clone)]
pub struct DieselCommunityRepository {
    pool: DbPool,
}

impl DieselCommunityRepository {
    /// Repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn visible_posts<'a, ST>(
    mut query: community_posts::BoxedQuery<'a, Pg, ST>,
    post_query: &PostQuery,
) -> community_posts::BoxedQuery<'a, Pg, ST> {
    let audiences: Vec<String> = post_query
        .audiences
        .iter()
        .map(|visibility| visibility.as_str().to_owned())
        .collect();
    query = query.filter(
        community_posts::visibility
            .eq_any(audiences)
            .or(community_posts::author_id.eq(*post_query.viewer.as_uuid())),
    );
    let filter = &post_query.filter;
    if let Some(instrument) = &filter.instrument {
        query = query.filter(community_posts::instrument.ilike(literal_pattern(instrument)));
    }
    if let Some(author_id) = filter.author_id {
        query = query.filter(community_posts::author_id.eq(*author_id.as_uuid()));
    }
    if let Some(media_type) = filter.media_type {
        query = query.filter(community_posts::media_type.eq(media_type.as_str()));
    }
    query
}

async fn load_counters(
    conn: &mut AsyncPgConnection,
    post_ids: &[Uuid],
    viewer: &UserId,
) -> QueryResult<HashMap<Uuid, PostCounters>> {
    let mut counters: HashMap<Uuid, PostCounters> = HashMap::new();
    if post_ids.is_empty() {
        return Ok(counters);
    }
    let likes = post_likes::table
        .filter(post_likes::post_id.eq_any(post_ids))
        .group_by(post_likes::post_id)
        .select((post_likes::post_id, count_star()))
        .load::<(Uuid, i64)>(conn)
        .await?;
    for (post_id, count) in likes {
        counters.entry(post_id).or_default().likes = from_db_count(count);
    }
    let comments = post_comments::table
        .filter(post_comments::post_id.eq_any(post_ids))
        .group_by(post_comments::post_id)
        .select((post_comments::post_id, count_star()))
        .load::<(Uuid, i64)>(conn)
        .await?;
    for (post_id, count) in comments {
        counters.entry(post_id).or_default().comments = from_db_count(count);
    }
    let liked: HashSet<Uuid> = post_likes::table
        .filter(post_likes::post_id.eq_any(post_ids))
        .filter(post_likes::user_id.eq(*viewer.as_uuid()))
        .select(post_likes::post_id)
        .load::<Uuid>(conn)
        .await?
        .into_iter()
        .collect();
    for post_id in liked {
        counters.entry(post_id).or_default().liked_by_viewer = true;
    }
    Ok(counters)
}

async fn assemble_posts(
    conn: &mut AsyncPgConnection,
    rows: Vec<CommunityPostRow>,
    viewer: &UserId,
) -> Result<Vec<CommunityPost>, CommunityRepositoryError> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let counters = load_counters(conn, &ids, viewer)
        .await
        .map_err(map_diesel_error)?;
    let names = load_user_names(conn, rows.iter().map(|row| row.author_id))
        .await
        .map_err(map_diesel_error)?;
    rows.into_iter()
        .map(|row| {
            let counts = counters.get(&row.id).copied().unwrap_or_default();
            row.into_post(&names, counts)
                .map_err(CommunityRepositoryError::from)
        })
        .collect()
}

#[async_trait]
impl CommunityRepository for DieselCommunityRepository {
    async fn insert_post(&self, post: &CommunityPost) -> Result<(), CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(community_posts::table)
            .values(&CommunityPostRow::from(post))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        page: &PageRequest,
    ) -> Result<(Vec<CommunityPost>, u64), CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total = visible_posts(community_posts::table.count().into_boxed(), query)
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let (limit, offset) = page_window(page);
        let rows = visible_posts(
            community_posts::table
                .select(CommunityPostRow::as_select())
                .into_boxed(),
            query,
        )
        .order((community_posts::created_at.desc(), community_posts::id.asc()))
        .limit(limit)
        .offset(offset)
        .load::<CommunityPostRow>(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        let posts = assemble_posts(&mut conn, rows, &query.viewer).await?;
        Ok((posts, from_db_count(total)))
    }

    async fn find_post(
        &self,
        id: &Uuid,
        viewer: &UserId,
    ) -> Result<Option<CommunityPost>, CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = community_posts::table
            .find(*id)
            .select(CommunityPostRow::as_select())
            .first::<CommunityPostRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(assemble_posts(&mut conn, vec![row], viewer).await?.pop())
    }

    async fn delete_post(&self, id: &Uuid) -> Result<bool, CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(community_posts::table.find(*id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn toggle_like(
        &self,
        post_id: &Uuid,
        user_id: &UserId,
    ) -> Result<LikeState, CommunityRepositoryError> {
        let post_id = *post_id;
        let user_id = *user_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (liked, count) = conn
            .transaction(|conn| {
                async move {
                    let inserted = diesel::insert_into(post_likes::table)
                        .values((
                            post_likes::post_id.eq(post_id),
                            post_likes::user_id.eq(user_id),
                            post_likes::created_at.eq(Utc::now()),
                        ))
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                    if inserted == 0 {
                        diesel::delete(post_likes::table.find((post_id, user_id)))
                            .execute(conn)
                            .await?;
                    }
                    let count = post_likes::table
                        .filter(post_likes::post_id.eq(post_id))
                        .count()
                        .get_result::<i64>(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>((inserted > 0, count))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(LikeState {
            liked,
            like_count: from_db_count(count),
        })
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(post_comments::table)
            .values(&CommentRow::from(comment))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_comments(&self, post_id: &Uuid) -> Result<Vec<Comment>, CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = post_comments::table
            .filter(post_comments::post_id.eq(*post_id))
            .select(CommentRow::as_select())
            .order((post_comments::created_at.asc(), post_comments::id.asc()))
            .load::<CommentRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let names = load_user_names(&mut conn, rows.iter().map(|row| row.author_id))
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_comment(&names))
            .collect())
    }

    async fn find_comment(&self, id: &Uuid) -> Result<Option<Comment>, CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = post_comments::table
            .find(*id)
            .select(CommentRow::as_select())
            .first::<CommentRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let names = load_user_names(&mut conn, [row.author_id])
            .await
            .map_err(map_diesel_error)?;
        Ok(Some(row.into_comment(&names)))
    }

    async fn delete_comment(&self, id: &Uuid) -> Result<bool, CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(post_comments::table.find(*id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
