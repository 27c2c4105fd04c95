//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **realtime**: in-process room hub behind the realtime ports
//! - **media**: Cloudinary uploads for profile images and resource files
//! - **security**: Argon2id password hashing
//!
//! Adapters are thin translators between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod media;
pub mod persistence;
pub mod realtime;
pub mod security;
