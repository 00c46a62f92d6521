use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{http, web, App, HttpServer};
use condo_compress::config::AppConfig;
use condo_compress::handlers::AppState;
use condo_compress::routes;
use env_logger::Env;
use log::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::from_env();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let server_address = config.server_address();
    let allowed_origin = config.allowed_origin.clone();

    info!("- Max files per request: {}", config.max_files);
    info!("- Max file size: {} MB", config.max_file_size / (1024 * 1024));
    info!(
        "- Compression workers: {}",
        config
            .workers
            .map_or("auto".to_string(), |w| w.to_string())
    );
    if let Some(timeout) = config.file_timeout {
        info!("- Per-file timeout: {:?}", timeout);
    }

    let app_state = web::Data::new(AppState::new(config));

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                http::header::AUTHORIZATION,
                http::header::ACCEPT,
                http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(1200);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind(&server_address)?
    .run();

    info!("Starting server at http://{}", server_address);

    server.await
}
