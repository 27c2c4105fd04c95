//! PostgreSQL-backed `ResourceRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use pagination::PageRequest;
use uuid::Uuid;

use crate::domain::ports::{ResourceRepository, ResourceRepositoryError};
use crate::domain::{Resource, ResourceFilter, UserId};

use super::diesel_basic_error_mapping::basic_error_mapping;
use super::diesel_helpers::{contains_pattern, load_user_names, page_window};
use super::models::{NewAssignmentRow, ResourceRow, from_db_count};
use super::pool::DbPool;
use super::schema::{resource_assignments, resources};

basic_error_mapping!(ResourceRepositoryError);

/// Diesel-backed implementation of the [`ResourceRepository`] port.
#[derive(Clone)]
pub struct DieselResourceRepository {
    pool: DbPool,
}

impl DieselResourceRepository {
    /// Repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn resource_filter<'a, ST>(
    mut query: resources::BoxedQuery<'a, Pg, ST>,
    filter: &ResourceFilter,
) -> resources::BoxedQuery<'a, Pg, ST> {
    if let Some(instrument) = &filter.instrument {
        query = query.filter(resources::instrument.ilike(instrument.trim().to_owned()));
    }
    if let Some(level) = filter.level {
        query = query.filter(resources::level.eq(level.as_str()));
    }
    if let Some(teacher_id) = filter.teacher_id {
        query = query.filter(resources::teacher_id.eq(*teacher_id.as_uuid()));
    }
    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        query = query.filter(
            resources::title
                .ilike(pattern.clone())
                .or(resources::description.ilike(pattern.clone()))
                .or(resources::category.ilike(pattern)),
        );
    }
    query
}

async fn with_names(
    conn: &mut AsyncPgConnection,
    rows: Vec<ResourceRow>,
) -> Result<Vec<Resource>, ResourceRepositoryError> {
    let names = load_user_names(conn, rows.iter().map(|row| row.teacher_id))
        .await
        .map_err(map_diesel_error)?;
    rows.into_iter()
        .map(|row| row.into_resource(&names).map_err(ResourceRepositoryError::from))
        .collect()
}

#[async_trait]
impl ResourceRepository for DieselResourceRepository {
    async fn insert(&self, resource: &Resource) -> Result<(), ResourceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(resources::table)
            .values(&ResourceRow::from(resource))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, resource: &Resource) -> Result<(), ResourceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(resources::table.find(resource.id))
            .set((
                resources::title.eq(&resource.title),
                resources::description.eq(resource.description.as_deref()),
                resources::file_url.eq(&resource.file_url),
                resources::file_type.eq(&resource.file_type),
                resources::instrument.eq(&resource.instrument),
                resources::level.eq(resource.level.as_str()),
                resources::category.eq(resource.category.as_deref()),
                resources::updated_at.eq(resource.updated_at),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, ResourceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(resources::table.find(*id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Resource>, ResourceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = resources::table
            .find(*id)
            .select(ResourceRow::as_select())
            .first::<ResourceRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(with_names(&mut conn, vec![row]).await?.pop())
    }

    async fn list(
        &self,
        filter: &ResourceFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Resource>, u64), ResourceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total = resource_filter(resources::table.count().into_boxed(), filter)
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let (limit, offset) = page_window(page);
        let rows = resource_filter(
            resources::table.select(ResourceRow::as_select()).into_boxed(),
            filter,
        )
        .order((resources::created_at.desc(), resources::id.asc()))
        .limit(limit)
        .offset(offset)
        .load::<ResourceRow>(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok((with_names(&mut conn, rows).await?, from_db_count(total)))
    }

    async fn list_for_teacher(
        &self,
        teacher_id: &UserId,
    ) -> Result<Vec<Resource>, ResourceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = resources::table
            .filter(resources::teacher_id.eq(*teacher_id.as_uuid()))
            .select(ResourceRow::as_select())
            .order(resources::created_at.desc())
            .load::<ResourceRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_names(&mut conn, rows).await
    }

    async fn assign(
        &self,
        resource_id: &Uuid,
        student_ids: &[UserId],
        assigned_at: DateTime<Utc>,
    ) -> Result<Vec<UserId>, ResourceRepositoryError> {
        if student_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<NewAssignmentRow> = student_ids
            .iter()
            .map(|student| NewAssignmentRow {
                resource_id: *resource_id,
                student_id: *student.as_uuid(),
                assigned_at,
            })
            .collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let inserted = diesel::insert_into(resource_assignments::table)
            .values(&rows)
            .on_conflict_do_nothing()
            .returning(resource_assignments::student_id)
            .get_results::<Uuid>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(inserted.into_iter().map(UserId::from_uuid).collect())
    }

    async fn unassign(
        &self,
        resource_id: &Uuid,
        student_id: &UserId,
    ) -> Result<bool, ResourceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            resource_assignments::table
                .filter(resource_assignments::resource_id.eq(*resource_id))
                .filter(resource_assignments::student_id.eq(*student_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn list_assigned(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<Resource>, ResourceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = resource_assignments::table
            .inner_join(resources::table)
            .filter(resource_assignments::student_id.eq(*student_id.as_uuid()))
            .select(ResourceRow::as_select())
            .order(resource_assignments::assigned_at.desc())
            .load::<ResourceRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_names(&mut conn, rows).await
    }
}
