//! Domain primitives, aggregates, services, and ports.
//!
//! Purpose: define strongly typed entities for the tutoring marketplace and
//! the services that enforce its rules. Nothing in here knows about HTTP,
//! WebSockets, or SQL; adapters reach the domain through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - TraceId: per-request correlation identifier.
//! - Entities for users, availability, bookings, resources, practice,
//!   community, messaging, inquiries, media, realtime rooms, and admin data.
//! - `*ServiceImpl` types implementing the driving ports.

pub mod admin;
pub mod auth;
pub mod booking;
pub mod community;
pub mod error;
pub mod inquiry;
pub mod media;
pub mod message;
pub mod ports;
pub mod practice;
pub mod realtime;
pub mod resource;
pub mod schedule;
pub mod trace_id;
pub mod user;

mod admin_service;
mod auth_service;
mod availability_service;
mod booking_service;
mod community_service;
mod inquiry_service;
mod media_service;
mod message_service;
mod practice_service;
mod profile_service;
mod realtime_gateway;
mod resource_service;

pub use self::admin::{
    AdminStats, BookingCounts, ExportCollection, ExportCollectionParseError, ExportTable,
    RoleCounts,
};
pub use self::admin_service::AdminServiceImpl;
pub use self::auth::{
    AuthSession, AuthToken, AuthValidationError, AuthenticatedUser, LoginCredentials,
    PASSWORD_MIN, RegistrationDraft, RegistrationRequest,
};
pub use self::auth_service::{AuthServiceImpl, DEFAULT_TOKEN_TTL_HOURS};
pub use self::availability_service::AvailabilityServiceImpl;
pub use self::booking::{
    BOOKING_MESSAGE_MAX, Booking, BookingRequest, BookingStatus, BookingStatusParseError,
};
pub use self::booking_service::BookingServiceImpl;
pub use self::community::{
    Comment, CommunityPost, CommunityValidationError, LikeState, MediaType, PostDraft,
    PostFilter, PostQuery, PostWithComments, Visibility,
};
pub use self::community_service::CommunityServiceImpl;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::inquiry::{
    Inquiry, InquiryDraft, InquiryRequest, InquiryStatus, InquiryValidationError, LessonType,
};
pub use self::inquiry_service::InquiryServiceImpl;
pub use self::media::{
    DEFAULT_MAX_UPLOAD_BYTES, MediaKind, MediaUpload, MediaValidationError, UploadedMedia,
};
pub use self::media_service::MediaServiceImpl;
pub use self::message::{
    ConversationSummary, Message, MessageValidationError, clamp_conversation_limit,
    summarise_conversations,
};
pub use self::message_service::MessageServiceImpl;
pub use self::practice::{
    Goal, GoalDraft, GoalProgress, GoalUpdate, InstrumentMinutes, PracticeSession,
    PracticeSessionDraft, PracticeStats, PracticeValidationError, Recording, RecordingDraft,
    compute_stats,
};
pub use self::practice_service::PracticeServiceImpl;
pub use self::profile_service::UserProfileServiceImpl;
pub use self::realtime::{
    ConnectionId, GatewayAck, GatewayRequest, RealtimeEvent, RoomName, events,
};
pub use self::realtime_gateway::RealtimeGatewayImpl;
pub use self::resource::{
    Resource, ResourceContent, ResourceDraft, ResourceFilter, ResourceValidationError,
    SkillLevel,
};
pub use self::resource_service::ResourceServiceImpl;
pub use self::schedule::{
    AvailabilityDay, SLOTS_PER_DAY_MAX, ScheduleValidationError, TimeSlot, normalise_slots,
    parse_date,
};
pub use self::trace_id::TraceId;
pub use self::user::{
    DisplayName, EmailAddress, ProfileUpdate, ProfileUpdateDraft, Role, TeacherFilter, User,
    UserFilter, UserId, UserProfile, UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use musiconthego::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
