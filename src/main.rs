// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, load municipality boundaries and start HTTP server

mod config;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use services::MapController;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();
    let config_error = config.validate().err();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Some(e) = config_error {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting agro-territory-map service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );
    log::info!("Backend API: {}", config.backend_base_url);

    // 4. Build the map controller (backend client + boundary loader)
    let controller = match MapController::new(&config) {
        Ok(controller) => web::Data::new(controller),
        Err(e) => {
            log::error!("Failed to initialize map controller: {}", e);
            std::process::exit(1);
        }
    };

    // 5. Load municipality boundaries; crop layers fall back to capitals without them
    if let Err(e) = controller.reload_boundaries().await {
        log::warn!(
            "Municipality boundaries unavailable ({}); crop layers will use demonstration markers",
            e
        );
    }

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_data = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            // Application state (config and map controller)
            .app_data(config_data.clone())
            .app_data(controller.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::scale_config)
            .configure(handlers::layers_config)
            .configure(handlers::territories_config)
            .configure(handlers::map_config)
            .configure(handlers::admin_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
