use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::{clamp_persona_count, data_quality_score, AnalysisEngine};
use crate::normalizer::EngineError;
use crate::models::{Campaign, Persona};
use crate::session_store::SessionStore;

// Demo research data bundled with the dashboard, for users without their own
pub const DEMO_CUSTOMER_DATA: &str = r#"Age 34, Software Engineer, $85k income: "I need tools that save time and integrate well. Customer service response time is crucial."

Age 42, Teacher, $55k income: "Budget is always a concern with two kids. I research thoroughly before buying anything for the family."

Age 29, Marketing Manager, $70k income: "I love trying new products, especially if they're innovative. Social proof is important to me."

Age 51, Business Owner, $120k income: "Quality is non-negotiable. I'm willing to pay premium for excellent products and service."

Review: "Great product quality but wish the onboarding was simpler. Support team was helpful though."

Survey Response: "Price is reasonable for the value provided. My family uses this daily now."

Interview: "As a busy professional, I appreciate products that respect my time. The interface is intuitive."

Feedback: "Love the premium features, but would like more customization options for power users."

Age 38, Nurse, $65k income: "Healthcare worker here - I need reliable, professional-grade solutions I can trust."

Review: "Excellent ROI and my team's productivity improved significantly. Highly recommend for businesses.""#;

// Create a data structure to hold the engine and the session store
pub struct AppState {
    pub engine: Arc<AnalysisEngine>,
    pub store: Arc<SessionStore>,
}

// Define request and response types for the generation chain
#[derive(Deserialize)]
pub struct GenerateRequest {
    pub customer_data: String,
    pub product_info: String,
    pub num_personas: Option<usize>,
}

#[derive(Serialize)]
pub struct UsedFallback {
    pub analysis: bool,
    pub personas: bool,
    pub campaigns: bool,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub status: String,
    pub message: String,
    pub personas_generated: usize,
    pub campaigns_created: usize,
    pub data_quality_score: u32,
    pub used_fallback: UsedFallback,
}

#[derive(Deserialize)]
pub struct RefineRequest {
    pub feedback: String,
}

#[derive(Serialize)]
pub struct RefineResponse {
    pub status: String,
    pub used_fallback: bool,
    pub persona: Persona,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub personas_count: usize,
    pub campaigns_count: usize,
    pub avg_confidence: f64,
    pub total_market_coverage: f64,
    pub avg_predicted_roi: f64,
    pub implementation_readiness: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub provider: String,
    pub model: String,
    pub ready: bool,
    pub active_sessions: usize,
}

#[derive(Serialize)]
pub struct DemoDataResponse {
    pub customer_data: String,
}

// Map an engine error onto the visible HTTP surface. Only preconditions are
// client errors; anything else that escaped fallback substitution is internal.
fn error_response(err: EngineError) -> HttpResponse {
    match err {
        EngineError::Precondition(message) => HttpResponse::BadRequest().body(message),
        other => HttpResponse::InternalServerError().body(other.to_string()),
    }
}

// API endpoint to create a session with initialized defaults
pub async fn create_session_handler(data: web::Data<AppState>) -> impl Responder {
    let session = data.store.create_session().await;
    HttpResponse::Ok().json(session)
}

// API endpoint to fetch a session snapshot
pub async fn get_session_handler(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.store.get_session(&path.into_inner()).await {
        Some(session) => HttpResponse::Ok().json(session),
        None => HttpResponse::NotFound().body("Session not found"),
    }
}

// API endpoint to run the full generation chain for a session
pub async fn generate_handler(
    path: web::Path<String>,
    request: web::Json<GenerateRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let session_id = path.into_inner();
    if data.store.get_session(&session_id).await.is_none() {
        return HttpResponse::NotFound().body("Session not found");
    }

    let request = request.into_inner();
    let num_personas = clamp_persona_count(request.num_personas.unwrap_or(3));

    let result = match data
        .engine
        .generate(&request.customer_data, &request.product_info, num_personas)
        .await
    {
        Ok(result) => result,
        Err(err) => return error_response(err),
    };

    let quality = data_quality_score(&request.customer_data);
    let used_fallback = UsedFallback {
        analysis: result.analysis.origin.used_fallback(),
        personas: result.personas.origin.used_fallback(),
        campaigns: result.campaigns.origin.used_fallback(),
    };
    let personas_generated = result.personas.value.len();
    let campaigns_created = result.campaigns.value.len();

    let mut message = format!(
        "Generated {} personas and {} campaigns",
        personas_generated, campaigns_created
    );
    let substituted: Vec<&str> = [
        ("analysis", used_fallback.analysis),
        ("personas", used_fallback.personas),
        ("campaigns", used_fallback.campaigns),
    ]
    .iter()
    .filter(|(_, flag)| *flag)
    .map(|(step, _)| *step)
    .collect();
    if !substituted.is_empty() {
        message.push_str(&format!(
            "; fallback content was substituted for: {}",
            substituted.join(", ")
        ));
    }

    let updated = data
        .store
        .update_session(&session_id, |session| {
            session.analysis = Some(result.analysis.value.clone());
            session.personas = result.personas.value.clone();
            session.campaigns = result.campaigns.value.clone();
            session.analysis_from_fallback = result.analysis.origin.used_fallback();
            session.personas_from_fallback = result.personas.origin.used_fallback();
            session.campaigns_from_fallback = result.campaigns.origin.used_fallback();
            session.requested_personas = num_personas;
            session.generated_at = Some(chrono::Utc::now());
        })
        .await;

    if updated.is_none() {
        return HttpResponse::NotFound().body("Session not found");
    }

    HttpResponse::Ok().json(GenerateResponse {
        status: "complete".to_string(),
        message,
        personas_generated,
        campaigns_created,
        data_quality_score: quality,
        used_fallback,
    })
}

// API endpoint to refine one persona in place
pub async fn refine_persona_handler(
    path: web::Path<(String, usize)>,
    request: web::Json<RefineRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let (session_id, index) = path.into_inner();

    let session = match data.store.get_session(&session_id).await {
        Some(session) => session,
        None => return HttpResponse::NotFound().body("Session not found"),
    };

    let persona = match session.personas.get(index) {
        Some(persona) => persona.clone(),
        None => return HttpResponse::NotFound().body(format!("No persona at index {}", index)),
    };

    let refined = match data.engine.refine_persona(&persona, &request.feedback).await {
        Ok(refined) => refined,
        Err(err) => return error_response(err),
    };

    let used_fallback = refined.origin.used_fallback();
    let replacement = refined.value.clone();
    data.store
        .update_session(&session_id, |session| {
            if let Some(slot) = session.personas.get_mut(index) {
                *slot = refined.value.clone();
            }
        })
        .await;

    HttpResponse::Ok().json(RefineResponse {
        status: "complete".to_string(),
        used_fallback,
        persona: replacement,
    })
}

// API endpoint for the KPI block on the analytics tab
pub async fn metrics_handler(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.store.get_session(&path.into_inner()).await {
        Some(session) => HttpResponse::Ok().json(compute_metrics(&session.personas, &session.campaigns)),
        None => HttpResponse::NotFound().body("Session not found"),
    }
}

// API endpoint reporting engine readiness
pub async fn status_handler(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(StatusResponse {
        status: "online".to_string(),
        provider: format!("{:?}", data.engine.provider_type()),
        model: data.engine.model_name().to_string(),
        ready: data.engine.check_ready().is_ok(),
        active_sessions: data.store.session_count().await,
    })
}

// API endpoint serving the bundled demo research data
pub async fn demo_data_handler() -> impl Responder {
    HttpResponse::Ok().json(DemoDataResponse {
        customer_data: DEMO_CUSTOMER_DATA.to_string(),
    })
}

// Dashboard KPIs, with the original's defaults when a session is empty.
fn compute_metrics(personas: &[Persona], campaigns: &[Campaign]) -> MetricsResponse {
    let (avg_confidence, total_market_coverage) = if personas.is_empty() {
        (0.89, 85.0)
    } else {
        let confidence_sum: f64 = personas.iter().map(|p| p.confidence_score).sum();
        let market_sum: f64 = personas.iter().map(|p| p.market_size).sum();
        (confidence_sum / personas.len() as f64, market_sum)
    };

    let avg_predicted_roi = if campaigns.is_empty() {
        3.4
    } else {
        campaigns.iter().map(|c| c.predicted_roi).sum::<f64>() / campaigns.len() as f64
    };

    MetricsResponse {
        personas_count: personas.len(),
        campaigns_count: campaigns.len(),
        avg_confidence,
        total_market_coverage,
        avg_predicted_roi,
        implementation_readiness: "95%".to_string(),
    }
}
