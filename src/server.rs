//! HTTP surface.
//!
//! One chat endpoint, `POST /api/bio-llm`, accepting either
//! `multipart/form-data` (fields `message`, `sessionId`, plus any number of
//! `file*` entries) or `application/json`, and a health probe. Per-session
//! controllers live in memory for the lifetime of the process; there is no
//! database behind this surface.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::controller::{ChatController, RoundTrip, Submit, APOLOGY_MESSAGE};
use crate::detector::{self, Detection};
use crate::files::{self, FileAttachment};
use crate::logging;
use crate::prompts::ANALYSIS_DETECTION_PROMPT;
use crate::relay::{ChatMessage, ChatRelay, LlmClient, MAX_TOKENS, TEMPERATURE};

const ERROR_CODE: &str = "llm_request_failed";

type SharedController = Arc<Mutex<ChatController<Arc<LlmClient>>>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: Arc<LlmClient>,
    /// One controller per session behind its own lock; the map lock is only
    /// held for lookup, never across an upstream call.
    sessions: Arc<Mutex<HashMap<String, SharedController>>>,
}

impl AppState {
    pub fn new(config: Arc<Config>, relay: Arc<LlmClient>) -> Self {
        Self {
            config,
            relay,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size as usize;
    Router::new()
        .route("/api/bio-llm", post(bio_llm))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JSON body variants. The raw-conversation shape carries the full message
/// list; the round-trip shape carries one user message plus file metadata.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BioLlmRequest {
    Conversation {
        messages: Vec<ChatMessage>,
        #[serde(rename = "sessionId")]
        #[allow(dead_code)]
        session_id: Option<String>,
    },
    RoundTrip {
        message: String,
        #[serde(rename = "sessionId")]
        session_id: Option<String>,
        #[serde(default)]
        files: Vec<FileAttachment>,
    },
}

async fn bio_llm(State(state): State<AppState>, request: Request) -> Response {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        match Multipart::from_request(request, &()).await {
            Ok(multipart) => handle_multipart(state, multipart).await,
            Err(e) => bad_request(&format!("Malformed multipart body: {}", e)),
        }
    } else {
        let bytes = match Bytes::from_request(request, &()).await {
            Ok(bytes) => bytes,
            Err(e) => return bad_request(&format!("Unreadable request body: {}", e)),
        };
        match serde_json::from_slice::<BioLlmRequest>(&bytes) {
            Ok(body) => handle_json(state, body).await,
            Err(e) => bad_request(&format!("Malformed JSON body: {}", e)),
        }
    }
}

/// Multipart round trip. File bytes are drained for their size only; the
/// model sees a textual manifest, never the content.
async fn handle_multipart(state: AppState, mut multipart: Multipart) -> Response {
    let mut message = String::new();
    let mut session_id: Option<String> = None;
    let mut files: Vec<FileAttachment> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(&format!("Malformed multipart body: {}", e)),
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "message" => match field.text().await {
                Ok(text) => message = text,
                Err(e) => return bad_request(&format!("Unreadable field 'message': {}", e)),
            },
            "sessionId" => match field.text().await {
                Ok(text) => session_id = Some(text),
                Err(e) => return bad_request(&format!("Unreadable field 'sessionId': {}", e)),
            },
            name if name.starts_with("file") => {
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        return bad_request(&format!("Unreadable file '{}': {}", file_name, e))
                    }
                };
                let attachment = FileAttachment::new(file_name, bytes.len() as u64, mime_type);
                if let Err(reason) = files::validate_attachment(&attachment, &state.config) {
                    return bad_request(&reason);
                }
                files.push(attachment);
            }
            _ => {}
        }
    }

    run_session_round_trip(state, &message, &files, session_id).await
}

async fn handle_json(state: AppState, body: BioLlmRequest) -> Response {
    match body {
        BioLlmRequest::Conversation { messages, .. } => {
            handle_conversation(state, messages).await
        }
        BioLlmRequest::RoundTrip {
            message,
            session_id,
            files,
        } => {
            for file in &files {
                if let Err(reason) = files::validate_attachment(file, &state.config) {
                    return bad_request(&reason);
                }
            }
            run_session_round_trip(state, &message, &files, session_id).await
        }
    }
}

/// Raw-conversation passthrough. A conversation whose leading system message
/// is byte-identical to the detection prompt is a classification call and is
/// answered with the decoded detection object instead of `{content}`.
async fn handle_conversation(state: AppState, messages: Vec<ChatMessage>) -> Response {
    let is_detection = messages
        .first()
        .map(|m| m.role == "system" && m.content == ANALYSIS_DETECTION_PROMPT)
        .unwrap_or(false);

    let reply = state
        .relay
        .chat_completion(messages, TEMPERATURE, MAX_TOKENS)
        .await;

    match reply {
        Ok(text) => {
            if is_detection {
                let detection = detector::decode_detection(&text);
                if let Detection::Fallback { ref reason, .. } = detection {
                    logging::log_detector(None, &format!("Detection fallback: {}", reason));
                }
                Json(detection.into_value()).into_response()
            } else {
                Json(json!({ "content": text })).into_response()
            }
        }
        Err(e) => relay_failure(&e.to_string()),
    }
}

/// Route one submission through its session controller, creating the
/// controller on first sight of the session id.
async fn run_session_round_trip(
    state: AppState,
    message: &str,
    files: &[FileAttachment],
    session_id: Option<String>,
) -> Response {
    let session_id = session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let controller: SharedController = {
        let mut sessions = state.sessions.lock().await;
        Arc::clone(sessions.entry(session_id.clone()).or_insert_with(|| {
            Arc::new(Mutex::new(ChatController::new(
                Arc::clone(&state.relay),
                session_id.clone(),
            )))
        }))
    };

    // A held controller lock means a round trip is already in flight for
    // this session; reject instead of queueing behind the upstream call.
    let Ok(mut controller) = controller.try_lock() else {
        return session_busy();
    };

    match controller.submit(message, files).await {
        Submit::Ignored => bad_request("Empty submission"),
        Submit::Completed(round_trip) => {
            if round_trip.failed {
                return relay_failure("round trip failed");
            }
            Json(round_trip_payload(round_trip, &session_id, !files.is_empty())).into_response()
        }
    }
}

fn round_trip_payload(round_trip: RoundTrip, session_id: &str, has_files: bool) -> serde_json::Value {
    let mut payload = json!({
        "content": round_trip.reply,
        "sessionId": session_id,
        "needsDataUpload": round_trip.needs_upload_prompt,
    });
    if has_files {
        payload["analysisType"] = json!("file_analysis");
        payload["reasoning"] = json!("Files uploaded for analysis");
    } else {
        if let Some(analysis_type) = round_trip.analysis_type {
            payload["analysisType"] = json!(analysis_type);
        }
        if let Some(reasoning) = round_trip.detection_reasoning {
            payload["reasoning"] = json!(reasoning);
        }
    }
    if let Some(project) = round_trip.project {
        payload["project"] = json!(project);
    }
    payload
}

async fn health(State(state): State<AppState>) -> Response {
    Json(json!({
        "status": "ok",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
    }))
    .into_response()
}

fn session_busy() -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "error": "A request for this session is already in progress" })),
    )
        .into_response()
}

fn bad_request(reason: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": reason }))).into_response()
}

/// The fixed degraded response. Raw upstream detail goes to the log, not
/// the client.
fn relay_failure(detail: &str) -> Response {
    logging::log_error(None, &format!("Request failed: {}", detail));
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "content": APOLOGY_MESSAGE,
            "error": ERROR_CODE,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body_conversation_variant() {
        let body = r#"{"messages": [{"role": "user", "content": "hi"}], "sessionId": "s-1"}"#;
        let parsed: BioLlmRequest = serde_json::from_str(body).unwrap();
        assert!(matches!(parsed, BioLlmRequest::Conversation { .. }));
    }

    #[test]
    fn test_json_body_round_trip_variant() {
        let body = r#"{
            "message": "analyze this",
            "sessionId": "s-2",
            "files": [{"name": "reads.fastq", "size": 1024, "type": "text/plain"}]
        }"#;
        let parsed: BioLlmRequest = serde_json::from_str(body).unwrap();
        let BioLlmRequest::RoundTrip { message, files, .. } = parsed else {
            panic!("expected the round-trip variant");
        };
        assert_eq!(message, "analyze this");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "reads.fastq");
    }

    #[test]
    fn test_json_body_round_trip_without_files() {
        let body = r#"{"message": "hello", "sessionId": "s-3"}"#;
        let parsed: BioLlmRequest = serde_json::from_str(body).unwrap();
        assert!(matches!(
            parsed,
            BioLlmRequest::RoundTrip { ref files, .. } if files.is_empty()
        ));
    }

    fn sample_round_trip() -> RoundTrip {
        RoundTrip {
            reply: "Here is your analysis plan.".to_string(),
            needs_upload_prompt: true,
            analysis_type: Some(crate::detector::AnalysisType::Expression),
            detection_reasoning: Some("RNA-seq keywords detected.".to_string()),
            project: None,
            failed: false,
        }
    }

    #[test]
    fn test_round_trip_payload_uses_needs_data_upload_key() {
        let payload = round_trip_payload(sample_round_trip(), "s-1", false);

        assert_eq!(payload["content"], json!("Here is your analysis plan."));
        assert_eq!(payload["sessionId"], json!("s-1"));
        assert_eq!(payload["needsDataUpload"], json!(true));
        assert_eq!(payload["analysisType"], json!("expression"));
        assert_eq!(payload["reasoning"], json!("RNA-seq keywords detected."));
        assert!(payload.get("needsAnalysis").is_none());
    }

    #[test]
    fn test_round_trip_payload_with_files_overrides_detection_fields() {
        let mut round_trip = sample_round_trip();
        round_trip.needs_upload_prompt = false;

        let payload = round_trip_payload(round_trip, "s-2", true);
        assert_eq!(payload["needsDataUpload"], json!(false));
        assert_eq!(payload["analysisType"], json!("file_analysis"));
        assert_eq!(payload["reasoning"], json!("Files uploaded for analysis"));
    }

    fn test_state() -> AppState {
        let config = Config {
            api_base_url: "http://localhost:1".to_string(),
            api_key: "sk-test".to_string(),
            model: "test-model".to_string(),
            request_timeout: std::time::Duration::from_secs(1),
            max_file_size: 1024,
            allowed_extensions: vec!["*".to_string()],
            environment: "development".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
        };
        let relay = Arc::new(LlmClient::new(&config));
        AppState::new(Arc::new(config), relay)
    }

    #[tokio::test]
    async fn test_in_flight_session_is_rejected_not_queued() {
        let state = test_state();
        let session_id = "busy-session".to_string();

        let controller: SharedController = Arc::new(Mutex::new(ChatController::new(
            Arc::clone(&state.relay),
            session_id.clone(),
        )));
        state
            .sessions
            .lock()
            .await
            .insert(session_id.clone(), Arc::clone(&controller));

        // Simulate an in-flight round trip by holding the controller lock.
        let _in_flight = controller.lock().await;

        let response = run_session_round_trip(state, "hello", &[], Some(session_id)).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
