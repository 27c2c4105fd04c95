//! Teaching resources and their assignment to students.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{PageRequest, Paginated};
use tracing::info;
use uuid::Uuid;

use super::profile_service::map_user_error;
use crate::domain::ports::{
    AssignmentOutcome, RealtimePublisher, ResourceRepository, ResourceService, UserRepository,
};
use crate::domain::{
    AuthenticatedUser, Error, RealtimeEvent, Resource, ResourceContent, ResourceFilter, Role,
    UserId, events,
};

/// Resource service implementing [`ResourceService`].
#[derive(Clone)]
pub struct ResourceServiceImpl<R, U> {
    resources: Arc<R>,
    users: Arc<U>,
    publisher: Arc<dyn RealtimePublisher>,
    clock: Arc<dyn Clock>,
}

impl<R, U> ResourceServiceImpl<R, U> {
    /// Wire the service to its repositories and publisher.
    pub fn new(
        resources: Arc<R>,
        users: Arc<U>,
        publisher: Arc<dyn RealtimePublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            resources,
            users,
            publisher,
            clock,
        }
    }
}

impl<R, U> ResourceServiceImpl<R, U>
where
    R: ResourceRepository,
{
    async fn find(&self, resource_id: &Uuid) -> Result<Resource, Error> {
        self.resources
            .find_by_id(resource_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("resource {resource_id} not found")))
    }

    async fn find_owned(
        &self,
        teacher: &AuthenticatedUser,
        resource_id: &Uuid,
    ) -> Result<Resource, Error> {
        let resource = self.find(resource_id).await?;
        if resource.teacher_id != teacher.id {
            return Err(Error::forbidden("only the owning teacher may manage this resource"));
        }
        Ok(resource)
    }
}

#[async_trait]
impl<R, U> ResourceService for ResourceServiceImpl<R, U>
where
    R: ResourceRepository,
    U: UserRepository,
{
    async fn create(
        &self,
        teacher: &AuthenticatedUser,
        content: ResourceContent,
    ) -> Result<Resource, Error> {
        teacher.require_role(&[Role::Teacher])?;
        let now = self.clock.utc();
        let ResourceContent {
            title,
            description,
            file_url,
            file_type,
            instrument,
            level,
            category,
        } = content;
        let resource = Resource {
            id: Uuid::new_v4(),
            teacher_id: teacher.id,
            teacher_name: teacher.name.clone(),
            title,
            description,
            file_url,
            file_type,
            instrument,
            level,
            category,
            created_at: now,
            updated_at: now,
        };
        self.resources
            .insert(&resource)
            .await
            .map_err(Error::from)?;
        info!(resource_id = %resource.id, teacher_id = %teacher.id, "resource created");
        Ok(resource)
    }

    async fn update(
        &self,
        teacher: &AuthenticatedUser,
        resource_id: &Uuid,
        content: ResourceContent,
    ) -> Result<Resource, Error> {
        let mut resource = self.find_owned(teacher, resource_id).await?;
        resource.replace_content(content, self.clock.utc());
        self.resources
            .update(&resource)
            .await
            .map_err(Error::from)?;
        Ok(resource)
    }

    async fn delete(&self, actor: &AuthenticatedUser, resource_id: &Uuid) -> Result<(), Error> {
        let resource = self.find(resource_id).await?;
        if !actor.is_admin() && resource.teacher_id != actor.id {
            return Err(Error::forbidden(
                "only the owning teacher or an admin may delete this resource",
            ));
        }
        self.resources
            .delete(resource_id)
            .await
            .map_err(Error::from)?;
        info!(resource_id = %resource_id, actor = %actor.id, "resource deleted");
        Ok(())
    }

    async fn list(
        &self,
        filter: ResourceFilter,
        page: PageRequest,
    ) -> Result<Paginated<Resource>, Error> {
        let (items, total) = self
            .resources
            .list(&filter, &page)
            .await
            .map_err(Error::from)?;
        Ok(Paginated::new(items, page, total))
    }

    async fn list_mine(&self, teacher: &AuthenticatedUser) -> Result<Vec<Resource>, Error> {
        self.resources
            .list_for_teacher(&teacher.id)
            .await
            .map_err(Error::from)
    }

    async fn assign(
        &self,
        teacher: &AuthenticatedUser,
        resource_id: &Uuid,
        student_ids: Vec<UserId>,
    ) -> Result<AssignmentOutcome, Error> {
        let resource = self.find_owned(teacher, resource_id).await?;
        let wanted: Vec<UserId> = student_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if wanted.is_empty() {
            return Err(Error::invalid_field(
                "studentIds",
                "empty",
                "at least one student is required",
            ));
        }

        let found = self
            .users
            .find_many(&wanted)
            .await
            .map_err(map_user_error)?;
        let students: BTreeSet<UserId> = found
            .iter()
            .filter(|user| user.role == Role::Student)
            .map(|user| user.id)
            .collect();
        if let Some(invalid) = wanted.iter().find(|id| !students.contains(id)) {
            return Err(Error::invalid_request(format!("{invalid} is not a student"))
                .with_details(serde_json::json!({
                    "field": "studentIds",
                    "value": invalid.to_string(),
                    "code": "not_a_student",
                })));
        }

        let newly_assigned = self
            .resources
            .assign(resource_id, &wanted, self.clock.utc())
            .await
            .map_err(Error::from)?;
        let event = RealtimeEvent::new(events::RESOURCE_ASSIGNED, &resource);
        for student in &newly_assigned {
            self.publisher.emit_to_user(student, event.clone());
        }
        info!(
            resource_id = %resource_id,
            requested = wanted.len(),
            assigned = newly_assigned.len(),
            "resource assigned"
        );
        Ok(AssignmentOutcome {
            resource_id: *resource_id,
            newly_assigned,
        })
    }

    async fn unassign(
        &self,
        teacher: &AuthenticatedUser,
        resource_id: &Uuid,
        student_id: &UserId,
    ) -> Result<(), Error> {
        self.find_owned(teacher, resource_id).await?;
        let removed = self
            .resources
            .unassign(resource_id, student_id)
            .await
            .map_err(Error::from)?;
        if removed {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "resource {resource_id} is not assigned to {student_id}"
            )))
        }
    }

    async fn list_assigned(&self, student: &AuthenticatedUser) -> Result<Vec<Resource>, Error> {
        self.resources
            .list_assigned(&student.id)
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    //! Resource ownership and assignment rules.
    use super::*;
    use crate::domain::ports::{MockResourceRepository, MockUserRepository};
    use crate::domain::{ErrorCode, ResourceDraft, SkillLevel, User};
    use crate::test_support::{RecordingPublisher, actor, fixture_clock, fixture_now, sample_user};

    fn resource_of(teacher: &User) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            teacher_id: teacher.id,
            teacher_name: teacher.name.to_string(),
            title: "Scales".to_owned(),
            description: None,
            file_url: "https://cdn.example.com/scales.pdf".to_owned(),
            file_type: "pdf".to_owned(),
            instrument: "piano".to_owned(),
            level: SkillLevel::Beginner,
            category: None,
            created_at: fixture_now(),
            updated_at: fixture_now(),
        }
    }

    fn service(
        resources: MockResourceRepository,
        users: MockUserRepository,
        publisher: Arc<RecordingPublisher>,
    ) -> ResourceServiceImpl<MockResourceRepository, MockUserRepository> {
        ResourceServiceImpl::new(Arc::new(resources), Arc::new(users), publisher, fixture_clock())
    }

    #[tokio::test]
    async fn create_stamps_teacher_details() {
        let teacher = sample_user(Role::Teacher, "Tess Teacher");
        let mut resources = MockResourceRepository::new();
        resources.expect_insert().times(1).return_once(|_| Ok(()));
        let content = ResourceContent::try_from(ResourceDraft {
            title: "Scales".to_owned(),
            file_url: "https://cdn.example.com/scales.pdf".to_owned(),
            file_type: "pdf".to_owned(),
            instrument: "piano".to_owned(),
            level: "beginner".to_owned(),
            ..ResourceDraft::default()
        })
        .expect("valid content");

        let created = service(resources, MockUserRepository::new(), Arc::default())
            .create(&actor(&teacher), content)
            .await
            .expect("create succeeds");

        assert_eq!(created.teacher_id, teacher.id);
        assert_eq!(created.teacher_name, "Tess Teacher");
    }

    #[tokio::test]
    async fn assign_notifies_only_new_students() {
        let teacher = sample_user(Role::Teacher, "Tess Teacher");
        let first = sample_user(Role::Student, "First Student");
        let second = sample_user(Role::Student, "Second Student");
        let resource = resource_of(&teacher);
        let id = resource.id;
        let first_id = first.id;
        let mut resources = MockResourceRepository::new();
        resources
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(resource)));
        resources
            .expect_assign()
            .withf(|_, students, _| students.len() == 2)
            .return_once(move |_, _, _| Ok(vec![first_id]));
        let mut users = MockUserRepository::new();
        let found = vec![first.clone(), second.clone()];
        users.expect_find_many().return_once(move |_| Ok(found));
        let publisher = Arc::new(RecordingPublisher::default());

        let outcome = service(resources, users, publisher.clone())
            .assign(&actor(&teacher), &id, vec![first.id, second.id, first.id])
            .await
            .expect("assign succeeds");

        assert_eq!(outcome.newly_assigned, vec![first.id]);
        assert_eq!(
            publisher.emitted(),
            vec![(format!("user:{}", first.id), events::RESOURCE_ASSIGNED.to_owned())]
        );
    }

    #[tokio::test]
    async fn assign_rejects_non_students() {
        let teacher = sample_user(Role::Teacher, "Tess Teacher");
        let colleague = sample_user(Role::Teacher, "Other Teacher");
        let resource = resource_of(&teacher);
        let id = resource.id;
        let mut resources = MockResourceRepository::new();
        resources
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(resource)));
        resources.expect_assign().times(0);
        let mut users = MockUserRepository::new();
        let found = vec![colleague.clone()];
        users.expect_find_many().return_once(move |_| Ok(found));

        let err = service(resources, users, Arc::default())
            .assign(&actor(&teacher), &id, vec![colleague.id])
            .await
            .expect_err("teachers cannot be assigned");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.details().and_then(|details| details.get("code")),
            Some(&serde_json::json!("not_a_student"))
        );
    }

    #[tokio::test]
    async fn update_requires_ownership() {
        let owner = sample_user(Role::Teacher, "Owner Teacher");
        let other = sample_user(Role::Teacher, "Other Teacher");
        let resource = resource_of(&owner);
        let id = resource.id;
        let content = ResourceContent::try_from(ResourceDraft {
            title: "Arpeggios".to_owned(),
            file_url: "https://cdn.example.com/arpeggios.pdf".to_owned(),
            file_type: "pdf".to_owned(),
            instrument: "piano".to_owned(),
            level: "advanced".to_owned(),
            ..ResourceDraft::default()
        })
        .expect("valid content");
        let mut resources = MockResourceRepository::new();
        resources
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(resource)));
        resources.expect_update().times(0);

        let err = service(resources, MockUserRepository::new(), Arc::default())
            .update(&actor(&other), &id, content)
            .await
            .expect_err("not the owner");

        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn admins_may_delete_any_resource() {
        let owner = sample_user(Role::Teacher, "Owner Teacher");
        let admin = sample_user(Role::Admin, "Root Admin");
        let resource = resource_of(&owner);
        let id = resource.id;
        let mut resources = MockResourceRepository::new();
        resources
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(resource)));
        resources.expect_delete().times(1).return_once(|_| Ok(true));

        service(resources, MockUserRepository::new(), Arc::default())
            .delete(&actor(&admin), &id)
            .await
            .expect("admin delete succeeds");
    }
}
