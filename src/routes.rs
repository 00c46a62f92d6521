use crate::handlers::{compress_images, health_check};
use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .route("/compress", web::post().to(compress_images)),
    );
}
