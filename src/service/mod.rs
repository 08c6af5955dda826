//service/mod.rs
pub mod multipart;

use actix_multipart::Multipart;
use actix_web::http::header::ContentType;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, info, warn};

use crate::app_state::AppState;
use crate::error::ErrorKind;
use crate::ingest::{SinglePhotoRequest, UploadRequest};
use crate::logging::with_peer;
use crate::service::multipart::{FormLimits, MultipartForm};

pub const BATCH_SUCCESS_BODY: &str = "Photos uploaded successfully!";
pub const SINGLE_SUCCESS_BODY: &str = "Photo uploaded successfully!";

fn peer_of(req: &HttpRequest) -> Option<String> {
    Some(req.peer_addr().map_or_else(|| "unknown".to_string(), |addr| addr.ip().to_string()))
}

/// Register the upload endpoints. Any method other than POST gets 405.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::post().to(upload_batch))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/photo")
            .route(web::post().to(upload_single))
            .default_service(web::to(method_not_allowed)),
    );
}

pub async fn method_not_allowed(req: HttpRequest) -> Result<HttpResponse, ErrorKind> {
    with_peer(peer_of(&req), async {
        warn!("Rejected {} {}", req.method(), req.path());
        Err(ErrorKind::MethodNotAllowed(req.method().to_string()))
    })
    .await
}

pub async fn upload_batch(
    req: HttpRequest,
    payload: Multipart,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ErrorKind> {
    with_peer(peer_of(&req), ingest_batch(payload, app_state)).await
}

async fn ingest_batch(payload: Multipart, app_state: web::Data<AppState>) -> Result<HttpResponse, ErrorKind> {
    let orchestrator = &app_state.orchestrator;

    let limits = FormLimits::from(&app_state.config.ingest);
    let form = MultipartForm::read(payload, orchestrator.work_dir(), &limits).await?;
    let request = UploadRequest::from_form(form)?;
    info!("Received batch {:?} with {} photos", request.title, request.photo_count);

    let batch = orchestrator.run(request).await;
    match serde_json::to_string(&batch) {
        Ok(summary) => debug!("Batch result: {}", summary),
        Err(e) => warn!("Could not serialize batch result: {}", e),
    }

    if let Some(e) = batch.overall_error {
        return Err(e);
    }
    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(BATCH_SUCCESS_BODY))
}

pub async fn upload_single(
    req: HttpRequest,
    payload: Multipart,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ErrorKind> {
    with_peer(peer_of(&req), ingest_single(payload, app_state)).await
}

async fn ingest_single(payload: Multipart, app_state: web::Data<AppState>) -> Result<HttpResponse, ErrorKind> {
    let orchestrator = &app_state.orchestrator;

    let limits = FormLimits::from(&app_state.config.ingest);
    let form = MultipartForm::read(payload, orchestrator.work_dir(), &limits).await?;
    let request = SinglePhotoRequest::from_form(form)?;
    let key = orchestrator.run_single(request).await?;
    info!("Stored {}", key);

    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(SINGLE_SUCCESS_BODY))
}
