//! Driving port for practice logging.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AuthenticatedUser, Error, Goal, GoalDraft, GoalUpdate, PracticeSession, PracticeSessionDraft,
    PracticeStats, Recording, RecordingDraft,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PracticeService: Send + Sync {
    async fn log_session(
        &self,
        student: &AuthenticatedUser,
        draft: PracticeSessionDraft,
    ) -> Result<PracticeSession, Error>;

    async fn list_sessions(
        &self,
        student: &AuthenticatedUser,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<PracticeSession>, Error>;

    async fn delete_session(
        &self,
        student: &AuthenticatedUser,
        session_id: &Uuid,
    ) -> Result<(), Error>;

    async fn stats(&self, student: &AuthenticatedUser) -> Result<PracticeStats, Error>;

    async fn create_goal(&self, student: &AuthenticatedUser, draft: GoalDraft)
    -> Result<Goal, Error>;

    async fn list_goals(&self, student: &AuthenticatedUser) -> Result<Vec<Goal>, Error>;

    async fn update_goal(
        &self,
        student: &AuthenticatedUser,
        goal_id: &Uuid,
        update: GoalUpdate,
    ) -> Result<Goal, Error>;

    async fn delete_goal(&self, student: &AuthenticatedUser, goal_id: &Uuid) -> Result<(), Error>;

    async fn create_recording(
        &self,
        student: &AuthenticatedUser,
        draft: RecordingDraft,
    ) -> Result<Recording, Error>;

    async fn list_recordings(&self, student: &AuthenticatedUser) -> Result<Vec<Recording>, Error>;

    /// Recordings students shared with the acting teacher.
    async fn list_shared_recordings(
        &self,
        teacher: &AuthenticatedUser,
    ) -> Result<Vec<Recording>, Error>;

    async fn give_feedback(
        &self,
        teacher: &AuthenticatedUser,
        recording_id: &Uuid,
        feedback: String,
    ) -> Result<Recording, Error>;
}
