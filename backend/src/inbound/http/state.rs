//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AdminService, AuthService, AvailabilityService, BookingService, CommunityService,
    InquiryService, MediaService, MessageService, PracticeService, ResourceService,
    UserProfileService,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: Arc<dyn AuthService>,
    pub profiles: Arc<dyn UserProfileService>,
    pub availability: Arc<dyn AvailabilityService>,
    pub bookings: Arc<dyn BookingService>,
    pub resources: Arc<dyn ResourceService>,
    pub practice: Arc<dyn PracticeService>,
    pub community: Arc<dyn CommunityService>,
    pub messages: Arc<dyn MessageService>,
    pub inquiries: Arc<dyn InquiryService>,
    pub media: Arc<dyn MediaService>,
    pub admin: Arc<dyn AdminService>,
}
