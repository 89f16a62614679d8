use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;

use crate::analysis_handlers::AppState;
use crate::export::{csv_export, json_export, markdown_report, share_summary};
use crate::session_store::SessionData;

fn attachment_header(stem: &str, extension: &str) -> (&'static str, String) {
    (
        "Content-Disposition",
        format!(
            "attachment; filename=\"{}_{}.{}\"",
            stem,
            Utc::now().format("%Y%m%d_%H%M%S"),
            extension
        ),
    )
}

async fn load_session(data: &web::Data<AppState>, id: &str) -> Option<SessionData> {
    data.store.get_session(id).await
}

// API endpoint to download the Markdown analysis report
pub async fn export_report_handler(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> impl Responder {
    match load_session(&data, &path.into_inner()).await {
        Some(session) => HttpResponse::Ok()
            .content_type("text/markdown")
            .insert_header(attachment_header("persona_campaign_report", "md"))
            .body(markdown_report(&session.personas, &session.campaigns)),
        None => HttpResponse::NotFound().body("Session not found"),
    }
}

// API endpoint to download the spreadsheet-compatible CSV
pub async fn export_csv_handler(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> impl Responder {
    match load_session(&data, &path.into_inner()).await {
        Some(session) => HttpResponse::Ok()
            .content_type("text/csv")
            .insert_header(attachment_header("persona_campaign_data", "csv"))
            .body(csv_export(&session.personas, &session.campaigns)),
        None => HttpResponse::NotFound().body("Session not found"),
    }
}

// API endpoint to download the raw canonical data with metadata
pub async fn export_json_handler(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> impl Responder {
    match load_session(&data, &path.into_inner()).await {
        Some(session) => HttpResponse::Ok()
            .insert_header(attachment_header("persona_analysis", "json"))
            .json(json_export(&session, data.engine.model_name())),
        None => HttpResponse::NotFound().body("Session not found"),
    }
}

// API endpoint to download the shareable stakeholder summary
pub async fn export_summary_handler(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> impl Responder {
    match load_session(&data, &path.into_inner()).await {
        Some(session) => HttpResponse::Ok()
            .content_type("text/markdown")
            .insert_header(attachment_header("persona_summary", "md"))
            .body(share_summary(&session.personas, &session.campaigns)),
        None => HttpResponse::NotFound().body("Session not found"),
    }
}
