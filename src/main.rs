// src/main.rs
use actix_files::Files;
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use log::info;
use std::sync::Arc;

mod config;
mod errors;
mod handlers;
mod models;
mod pipeline;
mod prompts;
mod session;
mod services;

use crate::config::Config;
use crate::handlers::{
    create_session, download_diagram, generate_diagram, get_session, upload_sketch, zoom,
};
use crate::pipeline::Pipeline;
use crate::services::{ImageEncoder, OpenAiBackend};
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub pipeline: Arc<Pipeline>,
    pub encoder: Arc<ImageEncoder>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting mermaider service...");

    // Fails fast on a missing credential instead of erroring at the first
    // generation attempt.
    let config = Config::from_env()?;

    let backend = Arc::new(OpenAiBackend::new(config.openai_api_key.clone()));
    let app_state = AppState {
        sessions: Arc::new(SessionStore::new()),
        pipeline: Arc::new(Pipeline::new(backend)),
        encoder: Arc::new(ImageEncoder::new()),
    };

    info!("Starting HTTP server on {}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .service(
                web::scope("/api/v1")
                    .route("/sessions", web::post().to(create_session))
                    .route("/sessions/{session_id}", web::get().to(get_session))
                    .route(
                        "/sessions/{session_id}/upload",
                        web::post().to(upload_sketch),
                    )
                    .route(
                        "/sessions/{session_id}/generate",
                        web::post().to(generate_diagram),
                    )
                    .route("/sessions/{session_id}/zoom", web::post().to(zoom))
                    .route(
                        "/sessions/{session_id}/download",
                        web::get().to(download_diagram),
                    ),
            )
            .route("/health", web::get().to(health_check))
            .service(Files::new("/", "./static").index_file("index.html"))
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;

    Ok(())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "mermaider",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
