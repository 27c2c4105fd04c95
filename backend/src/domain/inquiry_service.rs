//! Lesson inquiries from students to teachers.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use super::profile_service::require_teacher;
use crate::domain::ports::{InquiryRepository, InquiryService, RealtimePublisher, UserRepository};
use crate::domain::{
    AuthenticatedUser, Error, Inquiry, InquiryRequest, InquiryStatus, RealtimeEvent, Role, events,
};

/// Inquiry service implementing [`InquiryService`].
#[derive(Clone)]
pub struct InquiryServiceImpl<I, U> {
    inquiries: Arc<I>,
    users: Arc<U>,
    publisher: Arc<dyn RealtimePublisher>,
    clock: Arc<dyn Clock>,
}

impl<I, U> InquiryServiceImpl<I, U> {
    /// Wire the service to its repositories, publisher, and clock.
    pub fn new(
        inquiries: Arc<I>,
        users: Arc<U>,
        publisher: Arc<dyn RealtimePublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inquiries,
            users,
            publisher,
            clock,
        }
    }
}

#[async_trait]
impl<I, U> InquiryService for InquiryServiceImpl<I, U>
where
    I: InquiryRepository,
    U: UserRepository,
{
    async fn create(
        &self,
        student: &AuthenticatedUser,
        request: InquiryRequest,
    ) -> Result<Inquiry, Error> {
        student.require_role(&[Role::Student])?;
        let teacher = require_teacher(self.users.as_ref(), &request.teacher_id).await?;
        let InquiryRequest {
            teacher_id,
            instrument,
            level,
            age_group,
            lesson_type,
            availability,
            goals,
            message,
        } = request;
        let inquiry = Inquiry {
            id: Uuid::new_v4(),
            student_id: student.id,
            student_name: student.name.clone(),
            teacher_id,
            teacher_name: teacher.name.to_string(),
            instrument,
            level,
            age_group,
            lesson_type,
            availability,
            goals,
            message,
            status: InquiryStatus::New,
            created_at: self.clock.utc(),
        };
        self.inquiries
            .insert(&inquiry)
            .await
            .map_err(Error::from)?;
        info!(inquiry_id = %inquiry.id, teacher_id = %teacher_id, "inquiry created");
        self.publisher.emit_to_user(
            &teacher_id,
            RealtimeEvent::new(events::INQUIRY_CREATED, &inquiry),
        );
        Ok(inquiry)
    }

    async fn list_for_teacher(
        &self,
        teacher: &AuthenticatedUser,
        status: Option<InquiryStatus>,
    ) -> Result<Vec<Inquiry>, Error> {
        self.inquiries
            .list_for_teacher(&teacher.id, status)
            .await
            .map_err(Error::from)
    }

    async fn list_for_student(&self, student: &AuthenticatedUser) -> Result<Vec<Inquiry>, Error> {
        self.inquiries
            .list_for_student(&student.id)
            .await
            .map_err(Error::from)
    }

    async fn update_status(
        &self,
        teacher: &AuthenticatedUser,
        inquiry_id: &Uuid,
        status: InquiryStatus,
    ) -> Result<Inquiry, Error> {
        let mut inquiry = self
            .inquiries
            .find_by_id(inquiry_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("inquiry {inquiry_id} not found")))?;
        if inquiry.teacher_id != teacher.id {
            return Err(Error::forbidden(
                "only the addressed teacher may update this inquiry",
            ));
        }
        let from = inquiry.status;
        inquiry.advance(status)?;
        self.inquiries
            .update_status(inquiry_id, from, status)
            .await
            .map_err(Error::from)?;
        Ok(inquiry)
    }
}

#[cfg(test)]
mod tests {
    //! Inquiry workflow.
    use super::*;
    use crate::domain::ports::{InquiryRepositoryError, MockInquiryRepository, MockUserRepository};
    use crate::domain::{ErrorCode, InquiryDraft, User};
    use crate::test_support::{RecordingPublisher, actor, fixture_clock, sample_user};
    use rstest::rstest;

    fn request_to(teacher: &User) -> InquiryRequest {
        InquiryRequest::try_from(InquiryDraft {
            teacher_id: teacher.id,
            instrument: "guitar".to_owned(),
            level: "beginner".to_owned(),
            age_group: None,
            lesson_type: Some("online".to_owned()),
            availability: None,
            goals: None,
            message: "Looking for weekly lessons".to_owned(),
        })
        .expect("valid inquiry")
    }

    fn stored_inquiry(teacher: &User, status: InquiryStatus) -> Inquiry {
        let student = sample_user(Role::Student, "Sam Student");
        Inquiry {
            id: Uuid::new_v4(),
            student_id: student.id,
            student_name: student.name.to_string(),
            teacher_id: teacher.id,
            teacher_name: teacher.name.to_string(),
            instrument: "guitar".to_owned(),
            level: crate::domain::SkillLevel::Beginner,
            age_group: None,
            lesson_type: None,
            availability: None,
            goals: None,
            message: "Hello".to_owned(),
            status,
            created_at: crate::test_support::fixture_now(),
        }
    }

    fn service(
        inquiries: MockInquiryRepository,
        users: MockUserRepository,
        publisher: Arc<RecordingPublisher>,
    ) -> InquiryServiceImpl<MockInquiryRepository, MockUserRepository> {
        InquiryServiceImpl::new(Arc::new(inquiries), Arc::new(users), publisher, fixture_clock())
    }

    #[tokio::test]
    async fn create_notifies_teacher() {
        let student = sample_user(Role::Student, "Sam Student");
        let teacher = sample_user(Role::Teacher, "Tess Teacher");
        let request = request_to(&teacher);
        let teacher_id = teacher.id;
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(teacher)));
        let mut inquiries = MockInquiryRepository::new();
        inquiries.expect_insert().times(1).return_once(|_| Ok(()));
        let publisher = Arc::new(RecordingPublisher::default());

        let inquiry = service(inquiries, users, publisher.clone())
            .create(&actor(&student), request)
            .await
            .expect("inquiry created");

        assert_eq!(inquiry.status, InquiryStatus::New);
        assert_eq!(
            publisher.emitted(),
            vec![(format!("user:{teacher_id}"), events::INQUIRY_CREATED.to_owned())]
        );
    }

    #[rstest]
    #[case(InquiryStatus::New, InquiryStatus::Read, None)]
    #[case(InquiryStatus::New, InquiryStatus::Responded, None)]
    #[case(InquiryStatus::Read, InquiryStatus::New, Some(ErrorCode::Conflict))]
    #[case(InquiryStatus::Responded, InquiryStatus::Responded, Some(ErrorCode::Conflict))]
    #[tokio::test]
    async fn status_only_moves_forward(
        #[case] from: InquiryStatus,
        #[case] to: InquiryStatus,
        #[case] expected: Option<ErrorCode>,
    ) {
        let teacher = sample_user(Role::Teacher, "Tess Teacher");
        let inquiry = stored_inquiry(&teacher, from);
        let id = inquiry.id;
        let mut inquiries = MockInquiryRepository::new();
        inquiries
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(inquiry)));
        inquiries
            .expect_update_status()
            .times(usize::from(expected.is_none()))
            .returning(|_, _, _| Ok(()));

        let result = service(inquiries, MockUserRepository::new(), Arc::default())
            .update_status(&actor(&teacher), &id, to)
            .await;

        assert_eq!(result.err().map(|err| err.code()), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_status_change_is_a_conflict() {
        let teacher = sample_user(Role::Teacher, "Tess Teacher");
        let inquiry = stored_inquiry(&teacher, InquiryStatus::Read);
        let id = inquiry.id;
        let mut inquiries = MockInquiryRepository::new();
        inquiries
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(inquiry)));
        inquiries
            .expect_update_status()
            .withf(|_, from, to| *from == InquiryStatus::Read && *to == InquiryStatus::Responded)
            .return_once(|id, _, _| Err(InquiryRepositoryError::status_changed(id.to_string())));

        let err = service(inquiries, MockUserRepository::new(), Arc::default())
            .update_status(&actor(&teacher), &id, InquiryStatus::Responded)
            .await
            .expect_err("stale row");

        assert_eq!(err.code(), ErrorCode::Conflict);
    }
}
