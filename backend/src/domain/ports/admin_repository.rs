//! Port for admin-only aggregate reads.

use async_trait::async_trait;

use crate::domain::{AdminStats, ExportCollection};

use super::define_port_error;

define_port_error! {
    /// Errors raised by admin repository adapters.
    pub enum AdminRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable,
            "admin repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError, "admin repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Count users, bookings, resources, posts, and inquiries.
    async fn stats(&self) -> Result<AdminStats, AdminRepositoryError>;

    /// Rows for `collection`, each with one cell per header column.
    async fn export_rows(
        &self,
        collection: ExportCollection,
    ) -> Result<Vec<Vec<String>>, AdminRepositoryError>;
}
