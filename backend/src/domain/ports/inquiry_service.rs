//! Driving port for lesson inquiries.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AuthenticatedUser, Error, Inquiry, InquiryRequest, InquiryStatus};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InquiryService: Send + Sync {
    async fn create(
        &self,
        student: &AuthenticatedUser,
        request: InquiryRequest,
    ) -> Result<Inquiry, Error>;

    async fn list_for_teacher(
        &self,
        teacher: &AuthenticatedUser,
        status: Option<InquiryStatus>,
    ) -> Result<Vec<Inquiry>, Error>;

    async fn list_for_student(&self, student: &AuthenticatedUser) -> Result<Vec<Inquiry>, Error>;

    async fn update_status(
        &self,
        teacher: &AuthenticatedUser,
        inquiry_id: &Uuid,
        status: InquiryStatus,
    ) -> Result<Inquiry, Error>;
}
