//! PostgreSQL-backed `BookingRepository`.
//!
//! Participant names are not denormalised onto the booking row; each read
//! resolves them with one extra `users` lookup for the whole result set.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use pagination::PageRequest;
use uuid::Uuid;

use crate::domain::ports::{BookingRepository, BookingRepositoryError};
use crate::domain::{Booking, BookingStatus, UserId};

use super::diesel_basic_error_mapping::{basic_error_mapping, violates_constraint};
use super::diesel_helpers::{load_user_names, page_window};
use super::models::{BookingRow, from_db_count};
use super::pool::DbPool;
use super::schema::bookings;

basic_error_mapping!(BookingRepositoryError);

/// Exclusion constraint over `(teacher_id, slot range)` for active rows.
const NO_OVERLAP_CONSTRAINT: &str = "bookings_no_overlap";

/// Diesel-backed implementation of the [`BookingRepository`] port.
#[derive(Clone)]
pub struct DieselBookingRepository {
    pool: DbPool,
}

impl DieselBookingRepository {
    /// Repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn with_names(
    conn: &mut AsyncPgConnection,
    rows: Vec<BookingRow>,
) -> Result<Vec<Booking>, BookingRepositoryError> {
    let names = load_user_names(conn, rows.iter().flat_map(BookingRow::referenced_users))
        .await
        .map_err(map_diesel_error)?;
    rows.into_iter()
        .map(|row| row.into_booking(&names).map_err(BookingRepositoryError::from))
        .collect()
}

#[async_trait]
impl BookingRepository for DieselBookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(bookings::table)
            .values(&BookingRow::from(booking))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| {
                if violates_constraint(&error, NO_OVERLAP_CONSTRAINT) {
                    BookingRepositoryError::slot_taken(
                        booking.teacher_id.to_string(),
                        booking.date.to_string(),
                    )
                } else {
                    map_diesel_error(error)
                }
            })
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = bookings::table
            .find(*id)
            .select(BookingRow::as_select())
            .first::<BookingRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(with_names(&mut conn, vec![row]).await?.pop())
    }

    async fn list_for_student(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = bookings::table
            .filter(bookings::student_id.eq(*student_id.as_uuid()))
            .select(BookingRow::as_select())
            .order((bookings::date.desc(), bookings::start_time.desc()))
            .load::<BookingRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_names(&mut conn, rows).await
    }

    async fn list_for_teacher(
        &self,
        teacher_id: &UserId,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = bookings::table
            .filter(bookings::teacher_id.eq(*teacher_id.as_uuid()))
            .select(BookingRow::as_select())
            .order((bookings::date.desc(), bookings::start_time.desc()))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(bookings::status.eq(status.as_str()));
        }
        let rows = query
            .load::<BookingRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_names(&mut conn, rows).await
    }

    async fn list_active_on(
        &self,
        teacher_id: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let active: Vec<&str> = BookingStatus::ALL
            .into_iter()
            .filter(|status| status.is_active())
            .map(BookingStatus::as_str)
            .collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = bookings::table
            .filter(bookings::teacher_id.eq(*teacher_id.as_uuid()))
            .filter(bookings::date.eq(date))
            .filter(bookings::status.eq_any(active))
            .select(BookingRow::as_select())
            .order(bookings::start_time.asc())
            .load::<BookingRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_names(&mut conn, rows).await
    }

    async fn update_status(
        &self,
        id: &Uuid,
        from: BookingStatus,
        to: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            bookings::table
                .find(*id)
                .filter(bookings::status.eq(from.as_str())),
        )
        .set((
            bookings::status.eq(to.as_str()),
            bookings::updated_at.eq(updated_at),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(BookingRepositoryError::status_changed(id.to_string()));
        }
        Ok(())
    }

    async fn list_all(
        &self,
        status: Option<BookingStatus>,
        page: &PageRequest,
    ) -> Result<(Vec<Booking>, u64), BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut count = bookings::table.count().into_boxed();
        let mut query = bookings::table
            .select(BookingRow::as_select())
            .order((bookings::created_at.desc(), bookings::id.asc()))
            .into_boxed();
        if let Some(status) = status {
            count = count.filter(bookings::status.eq(status.as_str()));
            query = query.filter(bookings::status.eq(status.as_str()));
        }
        let total = count
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let (limit, offset) = page_window(page);
        let rows = query
            .limit(limit)
            .offset(offset)
            .load::<BookingRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok((with_names(&mut conn, rows).await?, from_db_count(total)))
    }
}
