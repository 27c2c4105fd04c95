//! PostgreSQL-backed `AvailabilityRepository`.
//!
//! The `(teacher_id, date)` unique key turns `upsert` into a single
//! `INSERT ... ON CONFLICT DO UPDATE` that keeps the original row id.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{AvailabilityRepository, AvailabilityRepositoryError};
use crate::domain::{AvailabilityDay, UserId};

use super::diesel_basic_error_mapping::basic_error_mapping;
use super::models::AvailabilityRow;
use super::pool::DbPool;
use super::schema::availability_days;

basic_error_mapping!(AvailabilityRepositoryError);

/// Diesel-backed implementation of the [`AvailabilityRepository`] port.
#[derive(Clone)]
pub struct DieselAvailabilityRepository {
    pool: DbPool,
}

impl DieselAvailabilityRepository {
    /// Repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn into_days(rows: Vec<AvailabilityRow>) -> Result<Vec<AvailabilityDay>, AvailabilityRepositoryError> {
    rows.into_iter()
        .map(|row| AvailabilityDay::try_from(row).map_err(AvailabilityRepositoryError::from))
        .collect()
}

#[async_trait]
impl AvailabilityRepository for DieselAvailabilityRepository {
    async fn upsert(
        &self,
        day: &AvailabilityDay,
    ) -> Result<AvailabilityDay, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = AvailabilityRow::from(day);
        let stored = diesel::insert_into(availability_days::table)
            .values(&row)
            .on_conflict((availability_days::teacher_id, availability_days::date))
            .do_update()
            .set((
                availability_days::slots.eq(excluded(availability_days::slots)),
                availability_days::updated_at.eq(excluded(availability_days::updated_at)),
            ))
            .returning(AvailabilityRow::as_returning())
            .get_result::<AvailabilityRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(AvailabilityDay::try_from(stored)?)
    }

    async fn list_for_teacher(
        &self,
        teacher_id: &UserId,
        from: Option<NaiveDate>,
    ) -> Result<Vec<AvailabilityDay>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = availability_days::table
            .filter(availability_days::teacher_id.eq(*teacher_id.as_uuid()))
            .select(AvailabilityRow::as_select())
            .order(availability_days::date.asc())
            .into_boxed();
        if let Some(from) = from {
            query = query.filter(availability_days::date.ge(from));
        }
        let rows = query
            .load::<AvailabilityRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_days(rows)
    }

    async fn find_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<AvailabilityDay>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = availability_days::table
            .find(*id)
            .select(AvailabilityRow::as_select())
            .first::<AvailabilityRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(AvailabilityDay::try_from).transpose()?)
    }

    async fn find_for_date(
        &self,
        teacher_id: &UserId,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityDay>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = availability_days::table
            .filter(availability_days::teacher_id.eq(*teacher_id.as_uuid()))
            .filter(availability_days::date.eq(date))
            .select(AvailabilityRow::as_select())
            .first::<AvailabilityRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(AvailabilityDay::try_from).transpose()?)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(availability_days::table.find(*id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
