//! Back-office record endpoints: users, policies, claims, appointments,
//! contact messages and portfolio statistics.

pub mod handlers;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/users", web::get().to(handlers::list_users))
        .route("/policies", web::get().to(handlers::list_policies))
        .route("/claims", web::get().to(handlers::list_claims))
        .route("/claims", web::post().to(handlers::create_claim))
        .route("/appointments", web::get().to(handlers::list_appointments))
        .route("/appointments", web::post().to(handlers::create_appointment))
        .route("/contact", web::post().to(handlers::submit_contact))
        .route("/contact-messages", web::get().to(handlers::list_contact_messages))
        .route("/statistics", web::get().to(handlers::statistics));
}
