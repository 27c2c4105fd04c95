//! PostgreSQL-backed `InquiryRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{InquiryRepository, InquiryRepositoryError};
use crate::domain::{Inquiry, InquiryStatus, UserId};

use super::diesel_basic_error_mapping::basic_error_mapping;
use super::diesel_helpers::load_user_names;
use super::models::InquiryRow;
use super::pool::DbPool;
use super::schema::inquiries;

basic_error_mapping!(InquiryRepositoryError);

/// Diesel-backed implementation of the [`InquiryRepository`] port.
#[derive(Clone)]
pub struct DieselInquiryRepository {
    pool: DbPool,
}

impl DieselInquiryRepository {
    /// Repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn with_names(
    conn: &mut AsyncPgConnection,
    rows: Vec<InquiryRow>,
) -> Result<Vec<Inquiry>, InquiryRepositoryError> {
    let names = load_user_names(conn, rows.iter().flat_map(InquiryRow::referenced_users))
        .await
        .map_err(map_diesel_error)?;
    rows.into_iter()
        .map(|row| row.into_inquiry(&names).map_err(InquiryRepositoryError::from))
        .collect()
}

#[async_trait]
impl InquiryRepository for DieselInquiryRepository {
    async fn insert(&self, inquiry: &Inquiry) -> Result<(), InquiryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(inquiries::table)
            .values(&InquiryRow::from(inquiry))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Inquiry>, InquiryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = inquiries::table
            .find(*id)
            .select(InquiryRow::as_select())
            .first::<InquiryRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(with_names(&mut conn, vec![row]).await?.pop())
    }

    async fn list_for_teacher(
        &self,
        teacher_id: &UserId,
        status: Option<InquiryStatus>,
    ) -> Result<Vec<Inquiry>, InquiryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = inquiries::table
            .filter(inquiries::teacher_id.eq(*teacher_id.as_uuid()))
            .select(InquiryRow::as_select())
            .order(inquiries::created_at.desc())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(inquiries::status.eq(status.as_str()));
        }
        let rows = query
            .load::<InquiryRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_names(&mut conn, rows).await
    }

    async fn list_for_student(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<Inquiry>, InquiryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = inquiries::table
            .filter(inquiries::student_id.eq(*student_id.as_uuid()))
            .select(InquiryRow::as_select())
            .order(inquiries::created_at.desc())
            .load::<InquiryRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_names(&mut conn, rows).await
    }

    async fn update_status(
        &self,
        id: &Uuid,
        from: InquiryStatus,
        to: InquiryStatus,
    ) -> Result<(), InquiryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            inquiries::table
                .find(*id)
                .filter(inquiries::status.eq(from.as_str())),
        )
        .set(inquiries::status.eq(to.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(InquiryRepositoryError::status_changed(id.to_string()));
        }
        Ok(())
    }
}
