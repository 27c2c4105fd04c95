//! PostgreSQL-backed `AdminRepository`: dashboard counts and CSV exports.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{AdminRepository, AdminRepositoryError};
use crate::domain::{AdminStats, BookingCounts, BookingStatus, ExportCollection, Role, RoleCounts};

use super::diesel_basic_error_mapping::basic_error_mapping;
use super::diesel_helpers::load_user_names;
use super::models::{
    BookingRow, CommunityPostRow, InquiryRow, ResourceRow, UserNames, UserRow, from_db_count,
};
use super::pool::DbPool;
use super::schema::{bookings, community_posts, inquiries, post_comments, post_likes, resources, users};

basic_error_mapping!(AdminRepositoryError);

/// Diesel-backed implementation of the [`AdminRepository`] port.
#[derive(Clone)]
pub struct DieselAdminRepository {
    pool: DbPool,
}

impl DieselAdminRepository {
    /// Repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn role_counts(grouped: &[(String, i64)]) -> RoleCounts {
    let mut counts = RoleCounts::default();
    for (role, count) in grouped {
        let count = from_db_count(*count);
        counts.total += count;
        match role.parse::<Role>() {
            Ok(Role::Student) => counts.students += count,
            Ok(Role::Teacher) => counts.teachers += count,
            Ok(Role::Admin) => counts.admins += count,
            Err(_) => {}
        }
    }
    counts
}

fn booking_counts(grouped: &[(String, i64)]) -> BookingCounts {
    let mut counts = BookingCounts::default();
    for (status, count) in grouped {
        let count = from_db_count(*count);
        counts.total += count;
        match status.parse::<BookingStatus>() {
            Ok(BookingStatus::Pending) => counts.pending += count,
            Ok(BookingStatus::Approved) => counts.approved += count,
            Ok(BookingStatus::Rejected) => counts.rejected += count,
            Ok(BookingStatus::Cancelled) => counts.cancelled += count,
            Err(_) => {}
        }
    }
    counts
}

fn user_cells(row: UserRow) -> Vec<String> {
    vec![
        row.id.to_string(),
        row.name,
        row.email,
        row.role,
        row.instruments.join(";"),
        row.location.unwrap_or_default(),
        row.hourly_rate.map(|rate| rate.to_string()).unwrap_or_default(),
        timestamp(row.created_at),
    ]
}

fn booking_cells(row: BookingRow, names: &UserNames) -> Vec<String> {
    vec![
        row.id.to_string(),
        names.name(&row.student_id),
        names.name(&row.teacher_id),
        row.date.format("%Y-%m-%d").to_string(),
        row.start_time.format("%H:%M").to_string(),
        row.end_time.format("%H:%M").to_string(),
        row.status,
        timestamp(row.created_at),
    ]
}

fn resource_cells(row: ResourceRow, names: &UserNames) -> Vec<String> {
    vec![
        row.id.to_string(),
        names.name(&row.teacher_id),
        row.title,
        row.instrument,
        row.level,
        row.file_type,
        row.file_url,
        timestamp(row.created_at),
    ]
}

fn inquiry_cells(row: InquiryRow, names: &UserNames) -> Vec<String> {
    vec![
        row.id.to_string(),
        names.name(&row.student_id),
        names.name(&row.teacher_id),
        row.instrument,
        row.level,
        row.status,
        row.message,
        timestamp(row.created_at),
    ]
}

fn post_cells(row: CommunityPostRow, names: &UserNames, likes: u64, comments: u64) -> Vec<String> {
    vec![
        row.id.to_string(),
        names.name(&row.author_id),
        row.title,
        row.media_type,
        row.visibility,
        likes.to_string(),
        comments.to_string(),
        timestamp(row.created_at),
    ]
}

async fn grouped_post_counts(
    conn: &mut AsyncPgConnection,
) -> QueryResult<(HashMap<Uuid, u64>, HashMap<Uuid, u64>)> {
    let likes = post_likes::table
        .group_by(post_likes::post_id)
        .select((post_likes::post_id, count_star()))
        .load::<(Uuid, i64)>(conn)
        .await?;
    let comments = post_comments::table
        .group_by(post_comments::post_id)
        .select((post_comments::post_id, count_star()))
        .load::<(Uuid, i64)>(conn)
        .await?;
    let collect = |pairs: Vec<(Uuid, i64)>| {
        pairs
            .into_iter()
            .map(|(id, count)| (id, from_db_count(count)))
            .collect::<HashMap<_, _>>()
    };
    Ok((collect(likes), collect(comments)))
}

#[async_trait]
impl AdminRepository for DieselAdminRepository {
    async fn stats(&self) -> Result<AdminStats, AdminRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let roles = users::table
            .group_by(users::role)
            .select((users::role, count_star()))
            .load::<(String, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let statuses = bookings::table
            .group_by(bookings::status)
            .select((bookings::status, count_star()))
            .load::<(String, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let resources = resources::table
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let posts = community_posts::table
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let inquiries = inquiries::table
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(AdminStats {
            users: role_counts(&roles),
            bookings: booking_counts(&statuses),
            resources: from_db_count(resources),
            posts: from_db_count(posts),
            inquiries: from_db_count(inquiries),
        })
    }

    async fn export_rows(
        &self,
        collection: ExportCollection,
    ) -> Result<Vec<Vec<String>>, AdminRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = match collection {
            ExportCollection::Users => users::table
                .select(UserRow::as_select())
                .order(users::created_at.desc())
                .load::<UserRow>(&mut conn)
                .await
                .map_err(map_diesel_error)?
                .into_iter()
                .map(user_cells)
                .collect(),
            ExportCollection::Bookings => {
                let rows = bookings::table
                    .select(BookingRow::as_select())
                    .order(bookings::created_at.desc())
                    .load::<BookingRow>(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                let names =
                    load_user_names(&mut conn, rows.iter().flat_map(BookingRow::referenced_users))
                        .await
                        .map_err(map_diesel_error)?;
                rows.into_iter()
                    .map(|row| booking_cells(row, &names))
                    .collect()
            }
            ExportCollection::Resources => {
                let rows = resources::table
                    .select(ResourceRow::as_select())
                    .order(resources::created_at.desc())
                    .load::<ResourceRow>(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                let names = load_user_names(&mut conn, rows.iter().map(|row| row.teacher_id))
                    .await
                    .map_err(map_diesel_error)?;
                rows.into_iter()
                    .map(|row| resource_cells(row, &names))
                    .collect()
            }
            ExportCollection::Inquiries => {
                let rows = inquiries::table
                    .select(InquiryRow::as_select())
                    .order(inquiries::created_at.desc())
                    .load::<InquiryRow>(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                let names =
                    load_user_names(&mut conn, rows.iter().flat_map(InquiryRow::referenced_users))
                        .await
                        .map_err(map_diesel_error)?;
                rows.into_iter()
                    .map(|row| inquiry_cells(row, &names))
                    .collect()
            }
            ExportCollection::Posts => {
                let rows = community_posts::table
                    .select(CommunityPostRow::as_select())
                    .order(community_posts::created_at.desc())
                    .load::<CommunityPostRow>(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                let names = load_user_names(&mut conn, rows.iter().map(|row| row.author_id))
                    .await
                    .map_err(map_diesel_error)?;
                let (likes, comments) = grouped_post_counts(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                rows.into_iter()
                    .map(|row| {
                        let like_count = likes.get(&row.id).copied().unwrap_or(0);
                        let comment_count = comments.get(&row.id).copied().unwrap_or(0);
                        post_cells(row, &names, like_count, comment_count)
                    })
                    .collect()
            }
        };
        Ok(rows)
    }
}
