use actix_files as fs;
use actix_web::{web, App, HttpServer, Responder};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use personaforge::analysis_handlers::{
    create_session_handler, demo_data_handler, generate_handler, get_session_handler,
    metrics_handler, refine_persona_handler, status_handler, AppState,
};
use personaforge::engine::AnalysisEngine;
use personaforge::engine_config::{EngineConfig, EngineConfigManager, ENGINE_CONFIG_FILE};
use personaforge::export_handlers::{
    export_csv_handler, export_json_handler, export_report_handler, export_summary_handler,
};
use personaforge::session_store::{spawn_cleanup, SessionStore};

#[derive(Parser, Debug)]
#[command(name = "personaforge", about = "Persona and campaign generation backend")]
struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the HTTP server to
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Path to the engine configuration file
    #[arg(long, default_value = ENGINE_CONFIG_FILE)]
    config: String,
}

// Index handler to serve the frontend
async fn index() -> impl Responder {
    fs::NamedFile::open_async("./frontend/dist/index.html").await
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // Load the engine configuration, falling back to defaults
    let config_manager = EngineConfigManager::new(&args.config);
    let config = match config_manager.load_config() {
        Ok(config) => {
            info!("Engine configuration loaded from {}", args.config);
            config
        }
        Err(e) => {
            warn!("Failed to load engine configuration from {}: {}", args.config, e);
            warn!("Continuing with the default configuration");
            EngineConfig::default()
        }
    };

    let engine = Arc::new(AnalysisEngine::new(config));
    info!(model = engine.model_name(), "analysis engine initialized");
    if let Err(e) = engine.check_ready() {
        warn!("generation requests will be rejected until credentials are provided: {}", e);
    }

    let store = Arc::new(SessionStore::new());
    spawn_cleanup(store.clone(), std::time::Duration::from_secs(300));

    // Create the app state
    let app_state = web::Data::new(AppState {
        engine,
        store,
    });

    info!("Starting server at http://{}:{}", args.host, args.port);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            // API routes
            .service(
                web::scope("/api")
                    .route("/status", web::get().to(status_handler))
                    .route("/demo-data", web::get().to(demo_data_handler))
                    .route("/sessions", web::post().to(create_session_handler))
                    .route("/sessions/{id}", web::get().to(get_session_handler))
                    .route("/sessions/{id}/generate", web::post().to(generate_handler))
                    .route(
                        "/sessions/{id}/personas/{index}/refine",
                        web::post().to(refine_persona_handler),
                    )
                    .route("/sessions/{id}/metrics", web::get().to(metrics_handler))
                    .route("/sessions/{id}/export/report", web::get().to(export_report_handler))
                    .route("/sessions/{id}/export/csv", web::get().to(export_csv_handler))
                    .route("/sessions/{id}/export/json", web::get().to(export_json_handler))
                    .route(
                        "/sessions/{id}/export/summary",
                        web::get().to(export_summary_handler),
                    ),
            )
            // Frontend routes
            .route("/", web::get().to(index))
            .service(fs::Files::new("/", "./frontend/dist"))
    })
    .bind((args.host.as_str(), args.port))?
    .run()
    .await
}
