//! Practice logging, goals, recordings, and statistics.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use super::profile_service::require_teacher;
use crate::domain::ports::{PracticeRepository, PracticeService, UserRepository};
use crate::domain::{
    AuthenticatedUser, Error, Goal, GoalDraft, GoalUpdate, PracticeSession, PracticeSessionDraft,
    PracticeStats, Recording, RecordingDraft, UserId, compute_stats,
};

fn ensure_owner(owner: &UserId, actor: &AuthenticatedUser, what: &str) -> Result<(), Error> {
    if *owner == actor.id {
        Ok(())
    } else {
        Err(Error::forbidden(format!("only the owning student may modify this {what}")))
    }
}

/// Practice service implementing [`PracticeService`].
#[derive(Clone)]
pub struct PracticeServiceImpl<P, U> {
    practice: Arc<P>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<P, U> PracticeServiceImpl<P, U> {
    /// Wire the service to its repositories and clock.
    pub fn new(practice: Arc<P>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            practice,
            users,
            clock,
        }
    }
}

impl<P, U> PracticeServiceImpl<P, U>
where
    P: PracticeRepository,
{
    async fn owned_goal(&self, student: &AuthenticatedUser, goal_id: &Uuid) -> Result<Goal, Error> {
        let goal = self
            .practice
            .find_goal(goal_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("goal {goal_id} not found")))?;
        ensure_owner(&goal.student_id, student, "goal")?;
        Ok(goal)
    }
}

#[async_trait]
impl<P, U> PracticeService for PracticeServiceImpl<P, U>
where
    P: PracticeRepository,
    U: UserRepository,
{
    async fn log_session(
        &self,
        student: &AuthenticatedUser,
        draft: PracticeSessionDraft,
    ) -> Result<PracticeSession, Error> {
        let session = PracticeSession::new(student.id, draft, self.clock.utc())?;
        self.practice
            .insert_session(&session)
            .await
            .map_err(Error::from)?;
        info!(
            student_id = %student.id,
            minutes = session.duration_minutes,
            "practice session logged"
        );
        Ok(session)
    }

    async fn list_sessions(
        &self,
        student: &AuthenticatedUser,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<PracticeSession>, Error> {
        if matches!((from, to), (Some(from), Some(to)) if from > to) {
            return Err(Error::invalid_field(
                "from",
                "reversed_range",
                "from must not be after to",
            ));
        }
        self.practice
            .list_sessions(&student.id, from, to)
            .await
            .map_err(Error::from)
    }

    async fn delete_session(
        &self,
        student: &AuthenticatedUser,
        session_id: &Uuid,
    ) -> Result<(), Error> {
        let session = self
            .practice
            .find_session(session_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("practice session {session_id} not found")))?;
        ensure_owner(&session.student_id, student, "session")?;
        self.practice
            .delete_session(session_id)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn stats(&self, student: &AuthenticatedUser) -> Result<PracticeStats, Error> {
        let sessions = self
            .practice
            .list_sessions(&student.id, None, None)
            .await
            .map_err(Error::from)?;
        let goals = self
            .practice
            .list_goals(&student.id)
            .await
            .map_err(Error::from)?;
        Ok(compute_stats(&sessions, &goals, self.clock.utc()))
    }

    async fn create_goal(
        &self,
        student: &AuthenticatedUser,
        draft: GoalDraft,
    ) -> Result<Goal, Error> {
        let goal = Goal::new(student.id, draft, self.clock.utc())?;
        self.practice
            .insert_goal(&goal)
            .await
            .map_err(Error::from)?;
        Ok(goal)
    }

    async fn list_goals(&self, student: &AuthenticatedUser) -> Result<Vec<Goal>, Error> {
        self.practice
            .list_goals(&student.id)
            .await
            .map_err(Error::from)
    }

    async fn update_goal(
        &self,
        student: &AuthenticatedUser,
        goal_id: &Uuid,
        update: GoalUpdate,
    ) -> Result<Goal, Error> {
        let mut goal = self.owned_goal(student, goal_id).await?;
        goal.apply(update)?;
        self.practice
            .update_goal(&goal)
            .await
            .map_err(Error::from)?;
        Ok(goal)
    }

    async fn delete_goal(&self, student: &AuthenticatedUser, goal_id: &Uuid) -> Result<(), Error> {
        self.owned_goal(student, goal_id).await?;
        self.practice
            .delete_goal(goal_id)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn create_recording(
        &self,
        student: &AuthenticatedUser,
        draft: RecordingDraft,
    ) -> Result<Recording, Error> {
        if let Some(teacher_id) = draft.teacher_id.as_ref() {
            require_teacher(self.users.as_ref(), teacher_id).await?;
        }
        let recording = Recording::new(student.id, student.name.clone(), draft, self.clock.utc())?;
        self.practice
            .insert_recording(&recording)
            .await
            .map_err(Error::from)?;
        Ok(recording)
    }

    async fn list_recordings(&self, student: &AuthenticatedUser) -> Result<Vec<Recording>, Error> {
        self.practice
            .list_recordings_for_student(&student.id)
            .await
            .map_err(Error::from)
    }

    async fn list_shared_recordings(
        &self,
        teacher: &AuthenticatedUser,
    ) -> Result<Vec<Recording>, Error> {
        self.practice
            .list_recordings_for_teacher(&teacher.id)
            .await
            .map_err(Error::from)
    }

    async fn give_feedback(
        &self,
        teacher: &AuthenticatedUser,
        recording_id: &Uuid,
        feedback: String,
    ) -> Result<Recording, Error> {
        let mut recording = self
            .practice
            .find_recording(recording_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("recording {recording_id} not found")))?;
        if recording.teacher_id != Some(teacher.id) {
            return Err(Error::forbidden(
                "only the teacher the recording was shared with may give feedback",
            ));
        }
        recording.set_feedback(&feedback)?;
        self.practice
            .update_recording(&recording)
            .await
            .map_err(Error::from)?;
        Ok(recording)
    }
}
