//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints (the server side
//! of the letter store) plus the master definition for the OpenAPI
//! specification and the three addressable page routes.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;
use valentine_core::domain::{Answer, LetterContent, PartialLetter};
use valentine_core::links;
use valentine_core::ports::StoreError;

use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_letter_handler,
        fetch_letter_handler,
        mark_opened_handler,
        record_response_handler,
        status_handler,
    ),
    components(
        schemas(
            CreateLetterRequest,
            CreateLetterResponse,
            LetterBody,
            OpenedResponse,
            RespondRequest,
            AnswerBody,
            StatusResponse,
        )
    ),
    tags(
        (name = "Valentine Letter API", description = "API endpoints for the hosted letter store.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A letter as composed. Omitted fields take the canonical defaults.
#[derive(Deserialize, ToSchema)]
pub struct CreateLetterRequest {
    pub recipient: Option<String>,
    pub opening: Option<String>,
    pub body: Option<String>,
    pub signature: Option<String>,
    pub postscript: Option<String>,
    pub sticker: Option<String>,
    pub tone: Option<u8>,
}

impl CreateLetterRequest {
    fn into_content(self) -> LetterContent {
        LetterContent::with_defaults(PartialLetter {
            recipient: self.recipient,
            opening: self.opening,
            body: self.body,
            signature: self.signature,
            postscript: self.postscript,
            sticker: self.sticker,
            tone: self.tone,
        })
        .sanitized()
    }
}

/// The payload sent after successfully sealing a letter. The sender token
/// appears here and on the status path only.
#[derive(Serialize, ToSchema)]
pub struct CreateLetterResponse {
    pub id: Uuid,
    pub sender_token: Uuid,
    pub recipient_url: String,
    pub status_url: String,
}

/// The content fields of a letter, as the recipient may see them.
#[derive(Serialize, ToSchema)]
pub struct LetterBody {
    pub recipient: String,
    pub opening: String,
    pub body: String,
    pub signature: String,
    pub postscript: String,
    pub sticker: String,
    pub tone: u8,
    /// The formatted letter text, ready for the typewriter reveal.
    pub formatted: String,
}

impl From<LetterContent> for LetterBody {
    fn from(content: LetterContent) -> Self {
        let formatted = content.format_for_display();
        Self {
            recipient: content.recipient,
            opening: content.opening,
            body: content.body,
            signature: content.signature,
            postscript: content.postscript,
            sticker: content.sticker,
            tone: content.tone,
            formatted,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct OpenedResponse {
    pub opened: bool,
}

#[derive(Deserialize, Serialize, Clone, Copy, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnswerBody {
    Yes,
    No,
}

impl From<AnswerBody> for Answer {
    fn from(answer: AnswerBody) -> Self {
        match answer {
            AnswerBody::Yes => Answer::Yes,
            AnswerBody::No => Answer::No,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RespondRequest {
    pub answer: AnswerBody,
}

/// The sender-facing view of a sealed letter.
#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    /// One of "unopened", "opened-pending", "matched", "declined".
    pub status: String,
    pub caption: String,
    pub emoji: String,
    pub letter: LetterBody,
    pub recipient_url: String,
    pub opened_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Seal a letter into the store.
#[utoipa::path(
    post,
    path = "/letters",
    request_body = CreateLetterRequest,
    responses(
        (status = 201, description = "Letter created", body = CreateLetterResponse),
        (status = 503, description = "The letter store is not configured"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_letter_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateLetterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let content = payload.into_content();
    match app_state.store.create(&content).await {
        Ok(ticket) => {
            let origin = &app_state.config.public_origin;
            let response = CreateLetterResponse {
                id: ticket.id,
                sender_token: ticket.sender_token,
                recipient_url: links::recipient_url(origin, ticket.id),
                status_url: links::status_url(origin, ticket.sender_token),
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(StoreError::Unavailable) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "The letter store is not configured".to_string(),
        )),
        Err(e) => {
            error!("Failed to create letter: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save the letter".to_string(),
            ))
        }
    }
}

/// Fetch a letter's content by its public id. The sender token never
/// travels on this path.
#[utoipa::path(
    get,
    path = "/letters/{id}",
    responses(
        (status = 200, description = "The letter's content", body = LetterBody),
        (status = 404, description = "No letter with this id")
    ),
    params(("id" = Uuid, Path, description = "The letter's public id."))
)]
pub async fn fetch_letter_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<LetterBody>, (StatusCode, String)> {
    match app_state.store.fetch_by_id(id).await {
        Ok(content) => Ok(Json(content.into())),
        // An unconfigured store looks like a missing letter to recipients.
        Err(StoreError::NotFound(_)) | Err(StoreError::Unavailable) => Err((
            StatusCode::NOT_FOUND,
            "Letter not found".to_string(),
        )),
        Err(e) => {
            error!("Failed to fetch letter {id}: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch the letter".to_string(),
            ))
        }
    }
}

/// Mark a letter opened. Idempotent: re-marking succeeds and keeps the
/// original timestamp.
#[utoipa::path(
    post,
    path = "/letters/{id}/opened",
    responses(
        (status = 200, description = "The letter is marked opened", body = OpenedResponse),
        (status = 404, description = "No letter with this id"),
        (status = 503, description = "The letter store is not configured")
    ),
    params(("id" = Uuid, Path, description = "The letter's public id."))
)]
pub async fn mark_opened_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OpenedResponse>, (StatusCode, String)> {
    match app_state.store.mark_opened(id).await {
        Ok(()) => Ok(Json(OpenedResponse { opened: true })),
        Err(StoreError::NotFound(_)) => {
            Err((StatusCode::NOT_FOUND, "Letter not found".to_string()))
        }
        Err(StoreError::Unavailable) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "The letter store is not configured".to_string(),
        )),
        Err(e) => {
            error!("Failed to mark letter {id} opened: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to mark the letter opened".to_string(),
            ))
        }
    }
}

/// Record the recipient's answer. Set-once: a second answer is ignored.
#[utoipa::path(
    post,
    path = "/letters/{id}/response",
    request_body = RespondRequest,
    responses(
        (status = 204, description = "The answer is recorded"),
        (status = 404, description = "No letter with this id"),
        (status = 503, description = "The letter store is not configured")
    ),
    params(("id" = Uuid, Path, description = "The letter's public id."))
)]
pub async fn record_response_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    match app_state.store.record_response(id, payload.answer.into()).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::NotFound(_)) => {
            Err((StatusCode::NOT_FOUND, "Letter not found".to_string()))
        }
        Err(StoreError::Unavailable) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "The letter store is not configured".to_string(),
        )),
        Err(e) => {
            error!("Failed to record response for letter {id}: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to record the response".to_string(),
            ))
        }
    }
}

/// Fetch the full status of a sealed letter by its private sender token.
#[utoipa::path(
    get,
    path = "/status/{token}",
    responses(
        (status = 200, description = "The letter's delivery status", body = StatusResponse),
        (status = 404, description = "No letter for this token")
    ),
    params(("token" = Uuid, Path, description = "The private sender token."))
)]
pub async fn status_handler(
    State(app_state): State<Arc<AppState>>,
    Path(token): Path<Uuid>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    match app_state.store.fetch_by_token(token).await {
        Ok(record) => {
            let status = record.status();
            Ok(Json(StatusResponse {
                status: status.label().to_string(),
                caption: status.caption().to_string(),
                emoji: status.emoji().to_string(),
                recipient_url: links::recipient_url(
                    &app_state.config.public_origin,
                    record.id,
                ),
                letter: record.content.into(),
                opened_at: record.opened_at,
                responded_at: record.responded_at,
                created_at: record.created_at,
            }))
        }
        Err(StoreError::NotFound(_)) | Err(StoreError::Unavailable) => Err((
            StatusCode::NOT_FOUND,
            "No letter for this status link".to_string(),
        )),
        Err(e) => {
            error!("Failed to fetch status: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch the status".to_string(),
            ))
        }
    }
}

//=========================================================================================
// Page Routes
//=========================================================================================

#[derive(Serialize)]
pub struct ComposerPage {
    pub letter: LetterBody,
    pub ws_path: &'static str,
}

/// The composer view at the root path. Bootstraps a client with the saved
/// draft (or the defaults) and the session endpoint.
pub async fn composer_page_handler(State(app_state): State<Arc<AppState>>) -> Json<ComposerPage> {
    Json(ComposerPage {
        letter: app_state.drafts.load().into(),
        ws_path: "/ws",
    })
}

/// The viewer view, addressed by a recipient link.
pub async fn viewer_page_handler(
    state: State<Arc<AppState>>,
    id: Path<Uuid>,
) -> Result<Json<LetterBody>, (StatusCode, String)> {
    fetch_letter_handler(state, id).await
}

/// The status view, addressed by a status link.
pub async fn status_page_handler(
    state: State<Arc<AppState>>,
    token: Path<Uuid>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    status_handler(state, token).await
}

/// Any unknown path leads back to the composer.
pub async fn fallback_handler() -> Redirect {
    Redirect::temporary("/")
}
