//! Teacher availability publishing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{AvailabilityRepository, AvailabilityService, RealtimePublisher};
use crate::domain::{
    AuthenticatedUser, AvailabilityDay, Error, RealtimeEvent, Role, RoomName, TimeSlot, UserId,
    events,
};

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityChanged<'a> {
    teacher_id: UserId,
    date: NaiveDate,
    slots: &'a [TimeSlot],
}

/// Availability service implementing [`AvailabilityService`].
#[derive(Clone)]
pub struct AvailabilityServiceImpl<R> {
    days: Arc<R>,
    publisher: Arc<dyn RealtimePublisher>,
    clock: Arc<dyn Clock>,
}

impl<R> AvailabilityServiceImpl<R> {
    /// Wire the service to its repository, publisher, and clock.
    pub fn new(days: Arc<R>, publisher: Arc<dyn RealtimePublisher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            days,
            publisher,
            clock,
        }
    }

    fn announce(&self, teacher_id: UserId, date: NaiveDate, slots: &[TimeSlot]) {
        self.publisher.emit_to_room(
            &RoomName::TeacherAvailability(teacher_id),
            RealtimeEvent::new(
                events::AVAILABILITY_UPDATED,
                &AvailabilityChanged {
                    teacher_id,
                    date,
                    slots,
                },
            ),
        );
    }
}

#[async_trait]
impl<R> AvailabilityService for AvailabilityServiceImpl<R>
where
    R: AvailabilityRepository,
{
    async fn set_day(
        &self,
        teacher: &AuthenticatedUser,
        date: NaiveDate,
        slots: Vec<TimeSlot>,
    ) -> Result<AvailabilityDay, Error> {
        teacher.require_role(&[Role::Teacher])?;
        let day = AvailabilityDay::new(Uuid::new_v4(), teacher.id, date, slots, self.clock.utc())?;
        let stored = self
            .days
            .upsert(&day)
            .await
            .map_err(Error::from)?;
        info!(teacher_id = %teacher.id, %date, slots = stored.slots().len(), "availability set");
        self.announce(teacher.id, date, stored.slots());
        Ok(stored)
    }

    async fn list_for_teacher(
        &self,
        teacher_id: &UserId,
        from: Option<NaiveDate>,
    ) -> Result<Vec<AvailabilityDay>, Error> {
        self.days
            .list_for_teacher(teacher_id, from)
            .await
            .map_err(Error::from)
    }

    async fn delete_day(&self, teacher: &AuthenticatedUser, day_id: &Uuid) -> Result<(), Error> {
        let day = self
            .days
            .find_by_id(day_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("availability {day_id} not found")))?;
        if day.teacher_id != teacher.id {
            return Err(Error::forbidden("only the owning teacher may delete availability"));
        }
        self.days
            .delete(day_id)
            .await
            .map_err(Error::from)?;
        self.announce(teacher.id, day.date, &[]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Availability service behaviour.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockAvailabilityRepository;
    use crate::test_support::{RecordingPublisher, actor, fixture_clock, sample_user};

    fn slot(start: &str, end: &str) -> TimeSlot {
        TimeSlot::parse(start, end).expect("valid slot")
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 9).expect("valid date")
    }

    #[tokio::test]
    async fn set_day_upserts_and_announces() {
        let teacher = actor(&sample_user(Role::Teacher, "Tess Teacher"));
        let mut repo = MockAvailabilityRepository::new();
        repo.expect_upsert()
            .times(1)
            .returning(|day| Ok(day.clone()));
        let publisher = Arc::new(RecordingPublisher::default());
        let service = AvailabilityServiceImpl::new(Arc::new(repo), publisher.clone(), fixture_clock());

        let day = service
            .set_day(&teacher, date(), vec![slot("14:00", "15:00"), slot("09:00", "10:00")])
            .await
            .expect("set day succeeds");

        assert_eq!(day.slots().first(), Some(&slot("09:00", "10:00")));
        assert_eq!(
            publisher.emitted(),
            vec![(
                format!("teacher-availability:{}", teacher.id),
                events::AVAILABILITY_UPDATED.to_owned()
            )]
        );
    }

    #[tokio::test]
    async fn set_day_rejects_overlaps_before_persisting() {
        let teacher = actor(&sample_user(Role::Teacher, "Tess Teacher"));
        let mut repo = MockAvailabilityRepository::new();
        repo.expect_upsert().times(0);
        let service = AvailabilityServiceImpl::new(
            Arc::new(repo),
            Arc::new(RecordingPublisher::default()),
            fixture_clock(),
        );

        let err = service
            .set_day(&teacher, date(), vec![slot("09:00", "10:30"), slot("10:00", "11:00")])
            .await
            .expect_err("overlap rejected");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.details().and_then(|details| details.get("code")),
            Some(&serde_json::json!("overlapping_slots"))
        );
    }

    #[tokio::test]
    async fn delete_day_forbids_other_teachers() {
        let owner = sample_user(Role::Teacher, "Owner Teacher");
        let intruder = actor(&sample_user(Role::Teacher, "Other Teacher"));
        let day = AvailabilityDay::new(
            Uuid::new_v4(),
            owner.id,
            date(),
            vec![slot("09:00", "10:00")],
            crate::test_support::fixture_now(),
        )
        .expect("valid day");
        let id = day.id;
        let mut repo = MockAvailabilityRepository::new();
        repo.expect_find_by_id()
            .return_once(move |_| Ok(Some(day)));
        repo.expect_delete().times(0);
        let service = AvailabilityServiceImpl::new(
            Arc::new(repo),
            Arc::new(RecordingPublisher::default()),
            fixture_clock(),
        );

        let err = service
            .delete_day(&intruder, &id)
            .await
            .expect_err("not the owner");

        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn delete_day_reports_missing_rows() {
        let teacher = actor(&sample_user(Role::Teacher, "Tess Teacher"));
        let mut repo = MockAvailabilityRepository::new();
        repo.expect_find_by_id().return_once(|_| Ok(None));
        let service = AvailabilityServiceImpl::new(
            Arc::new(repo),
            Arc::new(RecordingPublisher::default()),
            fixture_clock(),
        );

        let err = service
            .delete_day(&teacher, &Uuid::new_v4())
            .await
            .expect_err("missing day");

        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
