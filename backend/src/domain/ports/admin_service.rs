//! Driving port for the admin panel.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};

use crate::domain::{
    AdminStats, AuthenticatedUser, Booking, BookingStatus, Error, ExportCollection, ExportTable,
    User, UserFilter, UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminService: Send + Sync {
    async fn stats(&self) -> Result<AdminStats, Error>;

    async fn list_users(
        &self,
        filter: UserFilter,
        page: PageRequest,
    ) -> Result<Paginated<User>, Error>;

    /// Delete an account and, by cascade, everything it owns.
    async fn delete_user(&self, admin: &AuthenticatedUser, user_id: &UserId) -> Result<(), Error>;

    async fn list_bookings(
        &self,
        status: Option<BookingStatus>,
        page: PageRequest,
    ) -> Result<Paginated<Booking>, Error>;

    async fn export(&self, collection: ExportCollection) -> Result<ExportTable, Error>;
}
