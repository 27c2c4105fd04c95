//! Port for practice sessions, goals, and recordings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Goal, PracticeSession, Recording, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by practice repository adapters.
    pub enum PracticeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable,
            "practice repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError, "practice repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PracticeRepository: Send + Sync {
    async fn insert_session(&self, session: &PracticeSession) -> Result<(), PracticeRepositoryError>;

    /// Sessions newest first, bounded by the optional inclusive range.
    async fn list_sessions(
        &self,
        student_id: &UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<PracticeSession>, PracticeRepositoryError>;

    async fn find_session(&self, id: &Uuid)
    -> Result<Option<PracticeSession>, PracticeRepositoryError>;

    async fn delete_session(&self, id: &Uuid) -> Result<bool, PracticeRepositoryError>;

    async fn insert_goal(&self, goal: &Goal) -> Result<(), PracticeRepositoryError>;

    async fn list_goals(&self, student_id: &UserId) -> Result<Vec<Goal>, PracticeRepositoryError>;

    async fn find_goal(&self, id: &Uuid) -> Result<Option<Goal>, PracticeRepositoryError>;

    async fn update_goal(&self, goal: &Goal) -> Result<(), PracticeRepositoryError>;

    async fn delete_goal(&self, id: &Uuid) -> Result<bool, PracticeRepositoryError>;

    async fn insert_recording(&self, recording: &Recording) -> Result<(), PracticeRepositoryError>;

    async fn list_recordings_for_student(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<Recording>, PracticeRepositoryError>;

    async fn list_recordings_for_teacher(
        &self,
        teacher_id: &UserId,
    ) -> Result<Vec<Recording>, PracticeRepositoryError>;

    async fn find_recording(&self, id: &Uuid)
    -> Result<Option<Recording>, PracticeRepositoryError>;

    /// Persist teacher feedback for a recording.
    async fn update_recording(&self, recording: &Recording) -> Result<(), PracticeRepositoryError>;
}
