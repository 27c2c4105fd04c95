//! HTTP inbound adapter exposing REST endpoints.
//!
//! Everything except the health probes lives under `/api`. Handlers parse
//! and validate transport input, call one driving port, and map the result
//! back to JSON; no business rules live here.

use actix_web::web;

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod availability;
pub mod bookings;
pub mod community;
pub mod error;
pub mod health;
pub mod inquiries;
pub mod messages;
pub mod practice;
pub mod resources;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod uploads;
pub mod validation;

pub use crate::domain::ApiResult;

/// Register the `/api` scope.
///
/// Literal segments are registered ahead of `{id}` captures that share a
/// prefix so `/bookings/student/me` never parses `student` as an id.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(accounts::register)
            .service(accounts::login)
            .service(accounts::logout)
            .service(accounts::get_me)
            .service(accounts::update_me)
            .service(accounts::list_teachers)
            .service(accounts::get_teacher)
            .service(availability::list_mine)
            .service(availability::list_for_teacher)
            .service(availability::set_day)
            .service(availability::delete_day)
            .service(bookings::create_booking)
            .service(bookings::list_student_bookings)
            .service(bookings::list_teacher_bookings)
            .service(bookings::get_booking)
            .service(bookings::update_booking_status)
            .service(resources::create_resource)
            .service(resources::list_resources)
            .service(resources::list_my_resources)
            .service(resources::list_assigned_resources)
            .service(resources::update_resource)
            .service(resources::delete_resource)
            .service(resources::assign_resource)
            .service(resources::unassign_resource)
            .service(practice::log_session)
            .service(practice::list_sessions)
            .service(practice::delete_session)
            .service(practice::stats)
            .service(practice::create_goal)
            .service(practice::list_goals)
            .service(practice::update_goal)
            .service(practice::delete_goal)
            .service(practice::create_recording)
            .service(practice::list_recordings)
            .service(practice::list_shared_recordings)
            .service(practice::give_feedback)
            .service(community::list_posts)
            .service(community::create_post)
            .service(community::get_post)
            .service(community::delete_post)
            .service(community::toggle_like)
            .service(community::add_comment)
            .service(community::delete_comment)
            .service(messages::send_message)
            .service(messages::list_conversations)
            .service(messages::get_conversation)
            .service(messages::mark_read)
            .service(inquiries::create_inquiry)
            .service(inquiries::list_teacher_inquiries)
            .service(inquiries::list_student_inquiries)
            .service(inquiries::update_inquiry_status)
            .service(uploads::upload_profile_image)
            .service(uploads::upload_resource_file)
            .service(admin::stats)
            .service(admin::list_users)
            .service(admin::delete_user)
            .service(admin::list_bookings)
            .service(admin::export),
    );
}
