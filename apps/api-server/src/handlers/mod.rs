//! HTTP handlers and route configuration.

mod admin;
mod authors;
mod events;
mod health;
mod media;
mod posts;


use actix_web::web;

use crate::middleware::error::json_error_handler;

/// Configure all application routes.
///
/// `media_max_bytes` bounds the request body accepted by the upload route.
pub fn configure_routes(cfg: &mut web::ServiceConfig, media_max_bytes: usize) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::public_feed))
                    .route("", web::post().to(posts::create_post))
                    // Registered before `/{id}` so it is not parsed as an id.
                    .route("/events", web::get().to(events::post_events))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::patch().to(posts::update_post))
                    .route("/{id}", web::delete().to(posts::delete_post))
                    .route("/{id}/verify", web::post().to(posts::verify_post)),
            )
            .route("/authors/{id}/posts", web::get().to(authors::author_posts))
            .route(
                "/admin/verification",
                web::get().to(admin::pending_verification),
            )
            .service(
                web::resource("/media")
                    .app_data(web::PayloadConfig::new(media_max_bytes))
                    .route(web::post().to(media::upload)),
            ),
    );
}
