//! PostgreSQL-backed `PracticeRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{PracticeRepository, PracticeRepositoryError};
use crate::domain::{Goal, PracticeSession, Recording, UserId};

use super::diesel_basic_error_mapping::basic_error_mapping;
use super::diesel_helpers::load_user_names;
use super::models::{GoalRow, PracticeSessionRow, RecordingRow, to_db_int};
use super::pool::DbPool;
use super::schema::{practice_goals, practice_recordings, practice_sessions};

basic_error_mapping!(PracticeRepositoryError);

/// Diesel-backed implementation of the [`PracticeRepository`] port.
#[derive(Clone)]
pub struct DieselPracticeRepository {
    pool: DbPool,
}

impl DieselPracticeRepository {
    /// Repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn recordings_with_names(
    conn: &mut AsyncPgConnection,
    rows: Vec<RecordingRow>,
) -> Result<Vec<Recording>, PracticeRepositoryError> {
    let names = load_user_names(conn, rows.iter().map(|row| row.student_id))
        .await
        .map_err(map_diesel_error)?;
    rows.into_iter()
        .map(|row| row.into_recording(&names).map_err(PracticeRepositoryError::from))
        .collect()
}

#[async_trait]
impl PracticeRepository for DieselPracticeRepository {
    async fn insert_session(&self, session: &PracticeSession) -> Result<(), PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(practice_sessions::table)
            .values(&PracticeSessionRow::from(session))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_sessions(
        &self,
        student_id: &UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<PracticeSession>, PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = practice_sessions::table
            .filter(practice_sessions::student_id.eq(*student_id.as_uuid()))
            .select(PracticeSessionRow::as_select())
            .order(practice_sessions::practiced_at.desc())
            .into_boxed();
        if let Some(from) = from {
            query = query.filter(practice_sessions::practiced_at.ge(from));
        }
        if let Some(to) = to {
            query = query.filter(practice_sessions::practiced_at.le(to));
        }
        let rows = query
            .load::<PracticeSessionRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| PracticeSession::try_from(row).map_err(PracticeRepositoryError::from))
            .collect()
    }

    async fn find_session(
        &self,
        id: &Uuid,
    ) -> Result<Option<PracticeSession>, PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = practice_sessions::table
            .find(*id)
            .select(PracticeSessionRow::as_select())
            .first::<PracticeSessionRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(PracticeSession::try_from).transpose()?)
    }

    async fn delete_session(&self, id: &Uuid) -> Result<bool, PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(practice_sessions::table.find(*id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn insert_goal(&self, goal: &Goal) -> Result<(), PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(practice_goals::table)
            .values(&GoalRow::from(goal))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_goals(&self, student_id: &UserId) -> Result<Vec<Goal>, PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = practice_goals::table
            .filter(practice_goals::student_id.eq(*student_id.as_uuid()))
            .select(GoalRow::as_select())
            .order(practice_goals::created_at.desc())
            .load::<GoalRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| Goal::try_from(row).map_err(PracticeRepositoryError::from))
            .collect()
    }

    async fn find_goal(&self, id: &Uuid) -> Result<Option<Goal>, PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = practice_goals::table
            .find(*id)
            .select(GoalRow::as_select())
            .first::<GoalRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Goal::try_from).transpose()?)
    }

    async fn update_goal(&self, goal: &Goal) -> Result<(), PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(practice_goals::table.find(goal.id))
            .set((
                practice_goals::title.eq(&goal.title),
                practice_goals::instrument.eq(goal.instrument.as_deref()),
                practice_goals::target_minutes_per_week
                    .eq(to_db_int(goal.target_minutes_per_week)),
                practice_goals::due_date.eq(goal.due_date),
                practice_goals::completed.eq(goal.completed),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete_goal(&self, id: &Uuid) -> Result<bool, PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(practice_goals::table.find(*id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn insert_recording(&self, recording: &Recording) -> Result<(), PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(practice_recordings::table)
            .values(&RecordingRow::from(recording))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_recordings_for_student(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<Recording>, PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = practice_recordings::table
            .filter(practice_recordings::student_id.eq(*student_id.as_uuid()))
            .select(RecordingRow::as_select())
            .order(practice_recordings::created_at.desc())
            .load::<RecordingRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        recordings_with_names(&mut conn, rows).await
    }

    async fn list_recordings_for_teacher(
        &self,
        teacher_id: &UserId,
    ) -> Result<Vec<Recording>, PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = practice_recordings::table
            .filter(practice_recordings::teacher_id.eq(*teacher_id.as_uuid()))
            .select(RecordingRow::as_select())
            .order(practice_recordings::created_at.desc())
            .load::<RecordingRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        recordings_with_names(&mut conn, rows).await
    }

    async fn find_recording(
        &self,
        id: &Uuid,
    ) -> Result<Option<Recording>, PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = practice_recordings::table
            .find(*id)
            .select(RecordingRow::as_select())
            .first::<RecordingRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(recordings_with_names(&mut conn, vec![row]).await?.pop())
    }

    async fn update_recording(&self, recording: &Recording) -> Result<(), PracticeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(practice_recordings::table.find(recording.id))
            .set((
                practice_recordings::title.eq(&recording.title),
                practice_recordings::notes.eq(recording.notes.as_deref()),
                practice_recordings::teacher_feedback.eq(recording.teacher_feedback.as_deref()),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
