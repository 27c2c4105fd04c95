//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Each repository implements one domain port over a shared `bb8` pool of
//! `diesel-async` connections.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Authorisation and validation live in the domain services.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Typed errors**: pool and query failures are mapped onto each port's
//!   error enum by [`diesel_basic_error_mapping`].
//!
//! # Example
//!
//! ```ignore
//! use musiconthego::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/motg")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

mod diesel_admin_repository;
mod diesel_auth_token_repository;
mod diesel_availability_repository;
pub(crate) mod diesel_basic_error_mapping;
mod diesel_booking_repository;
mod diesel_community_repository;
pub(crate) mod diesel_helpers;
mod diesel_inquiry_repository;
mod diesel_message_repository;
mod diesel_practice_repository;
mod diesel_resource_repository;
mod diesel_user_repository;
pub(crate) mod models;
mod pool;
mod schema;

pub use diesel_admin_repository::DieselAdminRepository;
pub use diesel_auth_token_repository::DieselAuthTokenRepository;
pub use diesel_availability_repository::DieselAvailabilityRepository;
pub use diesel_booking_repository::DieselBookingRepository;
pub use diesel_community_repository::DieselCommunityRepository;
pub use diesel_inquiry_repository::DieselInquiryRepository;
pub use diesel_message_repository::DieselMessageRepository;
pub use diesel_practice_repository::DieselPracticeRepository;
pub use diesel_resource_repository::DieselResourceRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};

/// SQL migrations compiled into the binary and applied at startup.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
