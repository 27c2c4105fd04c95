//! Wire Diesel repositories, the room hub, and domain services into the
//! HTTP and WebSocket adapter states.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use musiconthego::domain::ports::{RealtimePublisher, RoomRegistry};
use musiconthego::domain::{
    AdminServiceImpl, AuthServiceImpl, AvailabilityServiceImpl, BookingServiceImpl,
    CommunityServiceImpl, InquiryServiceImpl, MediaServiceImpl, MessageServiceImpl,
    PracticeServiceImpl, RealtimeGatewayImpl, ResourceServiceImpl, UserProfileServiceImpl,
};
use musiconthego::inbound::http::state::HttpState;
use musiconthego::inbound::ws::state::WsState;
use musiconthego::outbound::persistence::{
    DieselAdminRepository, DieselAuthTokenRepository, DieselAvailabilityRepository,
    DieselBookingRepository, DieselCommunityRepository, DieselInquiryRepository,
    DieselMessageRepository, DieselPracticeRepository, DieselResourceRepository,
    DieselUserRepository,
};
use musiconthego::outbound::realtime::RoomHub;
use musiconthego::outbound::security::Argon2PasswordHasher;

use super::ServerConfig;

/// Concrete account service, kept typed so `main` can run maintenance
/// that is not part of the driving port.
pub type AccountService =
    AuthServiceImpl<DieselUserRepository, DieselAuthTokenRepository, Argon2PasswordHasher>;

/// Everything the server factory clones into each worker.
#[derive(Clone)]
pub struct AppServices {
    pub http_state: HttpState,
    pub ws_state: WsState,
    pub accounts: Arc<AccountService>,
}

/// Build every service over the configured pool.
pub fn build_services(config: &ServerConfig) -> AppServices {
    let pool = &config.db_pool;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let hub = Arc::new(RoomHub::default());
    let publisher: Arc<dyn RealtimePublisher> = hub.clone();
    let rooms: Arc<dyn RoomRegistry> = hub;

    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let availability = Arc::new(DieselAvailabilityRepository::new(pool.clone()));
    let bookings = Arc::new(DieselBookingRepository::new(pool.clone()));

    let accounts = Arc::new(
        AuthServiceImpl::new(
            users.clone(),
            Arc::new(DieselAuthTokenRepository::new(pool.clone())),
            Arc::new(Argon2PasswordHasher::default()),
            clock.clone(),
        )
        .with_token_ttl_hours(config.token_ttl_hours),
    );

    let http_state = HttpState {
        auth: accounts.clone(),
        profiles: Arc::new(UserProfileServiceImpl::new(users.clone(), clock.clone())),
        availability: Arc::new(AvailabilityServiceImpl::new(
            availability.clone(),
            publisher.clone(),
            clock.clone(),
        )),
        bookings: Arc::new(BookingServiceImpl::new(
            bookings.clone(),
            availability,
            users.clone(),
            publisher.clone(),
            clock.clone(),
        )),
        resources: Arc::new(ResourceServiceImpl::new(
            Arc::new(DieselResourceRepository::new(pool.clone())),
            users.clone(),
            publisher.clone(),
            clock.clone(),
        )),
        practice: Arc::new(PracticeServiceImpl::new(
            Arc::new(DieselPracticeRepository::new(pool.clone())),
            users.clone(),
            clock.clone(),
        )),
        community: Arc::new(CommunityServiceImpl::new(
            Arc::new(DieselCommunityRepository::new(pool.clone())),
            clock.clone(),
        )),
        messages: Arc::new(MessageServiceImpl::new(
            Arc::new(DieselMessageRepository::new(pool.clone())),
            users.clone(),
            publisher.clone(),
            clock.clone(),
        )),
        inquiries: Arc::new(InquiryServiceImpl::new(
            Arc::new(DieselInquiryRepository::new(pool.clone())),
            users.clone(),
            publisher,
            clock.clone(),
        )),
        media: Arc::new(
            MediaServiceImpl::new(config.media_store.clone(), users.clone(), clock)
                .with_max_upload_bytes(config.max_upload_bytes),
        ),
        admin: Arc::new(AdminServiceImpl::new(
            Arc::new(DieselAdminRepository::new(pool.clone())),
            users,
            bookings,
        )),
    };

    let ws_state = WsState::new(
        accounts.clone(),
        Arc::new(RealtimeGatewayImpl::new(rooms)),
        config.origins.clone(),
    );

    AppServices {
        http_state,
        ws_state,
        accounts,
    }
}
