//! Driving port for teaching resources.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{AuthenticatedUser, Error, Resource, ResourceContent, ResourceFilter, UserId};

/// Result of assigning a resource to students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOutcome {
    pub resource_id: Uuid,
    /// Students that did not already have the resource.
    pub newly_assigned: Vec<UserId>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceService: Send + Sync {
    async fn create(
        &self,
        teacher: &AuthenticatedUser,
        content: ResourceContent,
    ) -> Result<Resource, Error>;

    async fn update(
        &self,
        teacher: &AuthenticatedUser,
        resource_id: &Uuid,
        content: ResourceContent,
    ) -> Result<Resource, Error>;

    async fn delete(&self, actor: &AuthenticatedUser, resource_id: &Uuid) -> Result<(), Error>;

    async fn list(
        &self,
        filter: ResourceFilter,
        page: PageRequest,
    ) -> Result<Paginated<Resource>, Error>;

    async fn list_mine(&self, teacher: &AuthenticatedUser) -> Result<Vec<Resource>, Error>;

    async fn assign(
        &self,
        teacher: &AuthenticatedUser,
        resource_id: &Uuid,
        student_ids: Vec<UserId>,
    ) -> Result<AssignmentOutcome, Error>;

    async fn unassign(
        &self,
        teacher: &AuthenticatedUser,
        resource_id: &Uuid,
        student_id: &UserId,
    ) -> Result<(), Error>;

    async fn list_assigned(&self, student: &AuthenticatedUser) -> Result<Vec<Resource>, Error>;
}
