//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use serde_json::Value;

use crate::domain::ports::{
    MockAdminService, MockAuthService, MockAvailabilityService, MockBookingService,
    MockCommunityService, MockInquiryService, MockMediaService, MockMessageService,
    MockPracticeService, MockResourceService, MockUserProfileService,
};
use crate::domain::{Error, User};
use crate::inbound::http::state::HttpState;
use crate::test_support::actor;

pub const TEST_TOKEN: &str = "test-token";

/// One mock per driving port; configure the ones a test touches.
#[derive(Default)]
pub struct TestPorts {
    pub auth: MockAuthService,
    pub profiles: MockUserProfileService,
    pub availability: MockAvailabilityService,
    pub bookings: MockBookingService,
    pub resources: MockResourceService,
    pub practice: MockPracticeService,
    pub community: MockCommunityService,
    pub messages: MockMessageService,
    pub inquiries: MockInquiryService,
    pub media: MockMediaService,
    pub admin: MockAdminService,
}

impl TestPorts {
    /// Ports whose auth mock resolves [`TEST_TOKEN`] to `user`.
    pub fn signed_in(user: &User) -> Self {
        let mut ports = Self::default();
        let caller = actor(user);
        ports.auth.expect_authenticate().returning(move |token| {
            if token.expose() == TEST_TOKEN {
                Ok(caller.clone())
            } else {
                Err(Error::unauthorized("invalid or expired token"))
            }
        });
        ports
    }

    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState {
            auth: Arc::new(self.auth),
            profiles: Arc::new(self.profiles),
            availability: Arc::new(self.availability),
            bookings: Arc::new(self.bookings),
            resources: Arc::new(self.resources),
            practice: Arc::new(self.practice),
            community: Arc::new(self.community),
            messages: Arc::new(self.messages),
            inquiries: Arc::new(self.inquiries),
            media: Arc::new(self.media),
            admin: Arc::new(self.admin),
        })
    }
}

/// Application with the full `/api` surface over mocked ports.
pub fn api_app(
    ports: TestPorts,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(ports.into_state())
        .app_data(super::validation::json_config())
        .configure(super::configure)
}

/// `Authorization` header carrying [`TEST_TOKEN`].
pub fn bearer() -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {TEST_TOKEN}"))
}

/// Read a response body as JSON.
pub async fn json_body(response: ServiceResponse) -> Value {
    let bytes = test::read_body(response).await;
    serde_json::from_slice(&bytes).expect("response body is JSON")
}
