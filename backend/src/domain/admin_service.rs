//! Admin panel operations.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};
use tracing::{info, warn};

use super::profile_service::map_user_error;
use crate::domain::ports::{AdminRepository, AdminService, BookingRepository, UserRepository};
use crate::domain::{
    AdminStats, AuthenticatedUser, Booking, BookingStatus, Error, ExportCollection, ExportTable,
    User, UserFilter, UserId,
};

/// Admin service implementing [`AdminService`].
#[derive(Clone)]
pub struct AdminServiceImpl<A, U, B> {
    admin: Arc<A>,
    users: Arc<U>,
    bookings: Arc<B>,
}

impl<A, U, B> AdminServiceImpl<A, U, B> {
    /// Wire the service to its repositories.
    pub fn new(admin: Arc<A>, users: Arc<U>, bookings: Arc<B>) -> Self {
        Self {
            admin,
            users,
            bookings,
        }
    }
}

#[async_trait]
impl<A, U, B> AdminService for AdminServiceImpl<A, U, B>
where
    A: AdminRepository,
    U: UserRepository,
    B: BookingRepository,
{
    async fn stats(&self) -> Result<AdminStats, Error> {
        self.admin.stats().await.map_err(Error::from)
    }

    async fn list_users(
        &self,
        filter: UserFilter,
        page: PageRequest,
    ) -> Result<Paginated<User>, Error> {
        let (users, total) = self
            .users
            .list_users(&filter, &page)
            .await
            .map_err(map_user_error)?;
        Ok(Paginated::new(users, page, total))
    }

    async fn delete_user(&self, admin: &AuthenticatedUser, user_id: &UserId) -> Result<(), Error> {
        if admin.id == *user_id {
            return Err(Error::conflict("admins cannot delete their own account"));
        }
        let removed = self.users.delete(user_id).await.map_err(map_user_error)?;
        if !removed {
            return Err(Error::not_found(format!("user {user_id} not found")));
        }
        info!(user_id = %user_id, admin = %admin.id, "user deleted");
        Ok(())
    }

    async fn list_bookings(
        &self,
        status: Option<BookingStatus>,
        page: PageRequest,
    ) -> Result<Paginated<Booking>, Error> {
        let (bookings, total) = self
            .bookings
            .list_all(status, &page)
            .await
            .map_err(Error::from)?;
        Ok(Paginated::new(bookings, page, total))
    }

    async fn export(&self, collection: ExportCollection) -> Result<ExportTable, Error> {
        let rows = self
            .admin
            .export_rows(collection)
            .await
            .map_err(Error::from)?;
        let width = collection.headers().len();
        if let Some(row) = rows.iter().find(|row| row.len() != width) {
            warn!(collection = collection.as_str(), expected = width, actual = row.len(), "export row width mismatch");
            return Err(Error::internal(format!(
                "export for {} produced a malformed row",
                collection.as_str()
            )));
        }
        info!(collection = collection.as_str(), rows = rows.len(), "export generated");
        Ok(ExportTable { collection, rows })
    }
}

#[cfg(test)]
mod tests {
    //! Admin service rules.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::Role;
    use crate::domain::ports::{MockAdminRepository, MockBookingRepository, MockUserRepository};
    use crate::test_support::{actor, sample_user};

    type Service = AdminServiceImpl<MockAdminRepository, MockUserRepository, MockBookingRepository>;

    fn service(admin: MockAdminRepository, users: MockUserRepository) -> Service {
        AdminServiceImpl::new(
            Arc::new(admin),
            Arc::new(users),
            Arc::new(MockBookingRepository::new()),
        )
    }

    #[tokio::test]
    async fn admins_cannot_delete_themselves() {
        let admin = sample_user(Role::Admin, "Root Admin");
        let mut users = MockUserRepository::new();
        users.expect_delete().times(0);

        let err = service(MockAdminRepository::new(), users)
            .delete_user(&actor(&admin), &admin.id)
            .await
            .expect_err("self delete");

        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn deleting_unknown_user_is_not_found() {
        let admin = sample_user(Role::Admin, "Root Admin");
        let mut users = MockUserRepository::new();
        users.expect_delete().return_once(|_| Ok(false));

        let err = service(MockAdminRepository::new(), users)
            .delete_user(&actor(&admin), &UserId::random())
            .await
            .expect_err("unknown user");

        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn export_checks_row_width() {
        let mut admin = MockAdminRepository::new();
        admin
            .expect_export_rows()
            .return_once(|_| Ok(vec![vec!["only one cell".to_owned()]]));

        let err = service(admin, MockUserRepository::new())
            .export(ExportCollection::Users)
            .await
            .expect_err("malformed row");

        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[tokio::test]
    async fn export_returns_rows_with_headers() {
        let width = ExportCollection::Posts.headers().len();
        let mut admin = MockAdminRepository::new();
        admin
            .expect_export_rows()
            .return_once(move |_| Ok(vec![vec![String::new(); width]]));

        let table = service(admin, MockUserRepository::new())
            .export(ExportCollection::Posts)
            .await
            .expect("export succeeds");

        assert_eq!(table.headers().len(), width);
        assert_eq!(table.rows.len(), 1);
    }
}
