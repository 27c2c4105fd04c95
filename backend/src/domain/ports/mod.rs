//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, the password hasher, the media store, and the
//! realtime publisher) are implemented by outbound adapters. Driving ports
//! (the `*Service` traits and [`RealtimeGateway`]) are what inbound adapters
//! call.

mod macros;
pub(crate) use macros::define_port_error;

mod admin_repository;
mod admin_service;
mod auth_service;
mod auth_token_repository;
mod availability_repository;
mod availability_service;
mod booking_repository;
mod booking_service;
mod community_repository;
mod community_service;
mod inquiry_repository;
mod inquiry_service;
mod media_service;
mod media_store;
mod message_repository;
mod message_service;
mod password_hasher;
mod practice_repository;
mod practice_service;
mod profile_service;
mod realtime;
mod realtime_gateway;
mod resource_repository;
mod resource_service;
mod user_repository;

#[cfg(test)]
pub use admin_repository::MockAdminRepository;
pub use admin_repository::{AdminRepository, AdminRepositoryError};
#[cfg(test)]
pub use admin_service::MockAdminService;
pub use admin_service::AdminService;
#[cfg(test)]
pub use auth_service::MockAuthService;
pub use auth_service::AuthService;
#[cfg(test)]
pub use auth_token_repository::MockAuthTokenRepository;
pub use auth_token_repository::{AuthTokenRepository, AuthTokenRepositoryError, StoredToken};
#[cfg(test)]
pub use availability_repository::MockAvailabilityRepository;
pub use availability_repository::{AvailabilityRepository, AvailabilityRepositoryError};
#[cfg(test)]
pub use availability_service::MockAvailabilityService;
pub use availability_service::AvailabilityService;
#[cfg(test)]
pub use booking_repository::MockBookingRepository;
pub use booking_repository::{BookingRepository, BookingRepositoryError};
#[cfg(test)]
pub use booking_service::MockBookingService;
pub use booking_service::BookingService;
#[cfg(test)]
pub use community_repository::MockCommunityRepository;
pub use community_repository::{CommunityRepository, CommunityRepositoryError};
#[cfg(test)]
pub use community_service::MockCommunityService;
pub use community_service::CommunityService;
#[cfg(test)]
pub use inquiry_repository::MockInquiryRepository;
pub use inquiry_repository::{InquiryRepository, InquiryRepositoryError};
#[cfg(test)]
pub use inquiry_service::MockInquiryService;
pub use inquiry_service::InquiryService;
#[cfg(test)]
pub use media_service::MockMediaService;
pub use media_service::{IncomingFile, MediaService};
#[cfg(test)]
pub use media_store::MockMediaStore;
pub use media_store::{MediaStore, MediaStoreError, UnconfiguredMediaStore};
#[cfg(test)]
pub use message_repository::MockMessageRepository;
pub use message_repository::{MessageRepository, MessageRepositoryError};
#[cfg(test)]
pub use message_service::MockMessageService;
pub use message_service::MessageService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use practice_repository::MockPracticeRepository;
pub use practice_repository::{PracticeRepository, PracticeRepositoryError};
#[cfg(test)]
pub use practice_service::MockPracticeService;
pub use practice_service::PracticeService;
#[cfg(test)]
pub use profile_service::MockUserProfileService;
pub use profile_service::UserProfileService;
#[cfg(test)]
pub use realtime::{MockRealtimePublisher, MockRoomRegistry};
pub use realtime::{NoOpRealtimePublisher, RealtimePublisher, RoomRegistry};
#[cfg(test)]
pub use realtime_gateway::MockRealtimeGateway;
pub use realtime_gateway::RealtimeGateway;
#[cfg(test)]
pub use resource_repository::MockResourceRepository;
pub use resource_repository::{ResourceRepository, ResourceRepositoryError};
#[cfg(test)]
pub use resource_service::MockResourceService;
pub use resource_service::{AssignmentOutcome, ResourceService};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserPersistenceError, UserRepository};
