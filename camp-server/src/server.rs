//! HTTP surface: the chat form at `/`, a JSON endpoint at `/api/chat` and a
//! liveness probe at `/health`.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use camp_core::{CampAdvisor, ChatError, ChatRequest, config::ServerConfig};
use serde::{Deserialize, Serialize};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

const MAX_BODY_BYTES: usize = 64 * 1024;

const BAD_JSON_MESSAGE: &str = "Request body must be JSON like {\"message\": \"...\"}.";

#[derive(Clone)]
pub struct AppState {
    pub advisor: Arc<CampAdvisor>,
}

pub fn router(advisor: Arc<CampAdvisor>) -> Router {
    Router::new()
        .route("/", get(handle_index).post(handle_form))
        .route("/api/chat", post(handle_chat))
        .route("/health", get(|| async { "ok" }))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { advisor })
}

pub async fn serve(config: &ServerConfig, advisor: Arc<CampAdvisor>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}"))?;

    info!("Listening on http://{addr}");
    axum::serve(listener, router(advisor))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// JSON error response for a failed chat turn.
enum ApiError {
    BadJson(JsonRejection),
    Chat(ChatError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadJson(rejection) => {
                tracing::debug!("Rejected chat body: {}", rejection.body_text());
                let body = ErrorBody { error: BAD_JSON_MESSAGE.to_string() };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::Chat(e) => {
                let status = StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, Json(ErrorBody { error: e.user_message() })).into_response()
            }
        }
    }
}

/// POST /api/chat: `{"message": "..."}` in, `{"reply": "..."}` out.
async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(ApiError::BadJson)?;
    let reply = state.advisor.answer(&request).await.map_err(ApiError::Chat)?;
    Ok(Json(reply))
}

#[derive(Debug, Deserialize)]
struct ChatForm {
    message: Option<String>,
}

/// GET /: empty chat page.
async fn handle_index() -> Html<String> {
    Html(render_page(None, None, None))
}

/// POST /: form submission; renders the question with its answer or error.
async fn handle_form(State(state): State<AppState>, Form(form): Form<ChatForm>) -> Response {
    let message = form.message.unwrap_or_default();
    let request = ChatRequest { message: message.clone() };

    match state.advisor.answer(&request).await {
        Ok(reply) => Html(render_page(Some(&message), Some(&reply.reply), None)).into_response(),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let shown = Some(message.as_str()).filter(|m| !m.trim().is_empty());
            (status, Html(render_page(shown, None, Some(&e.user_message())))).into_response()
        }
    }
}

fn render_page(message: Option<&str>, answer: Option<&str>, error: Option<&str>) -> String {
    let mut conversation = String::new();
    if let Some(message) = message {
        conversation.push_str(&format!(
            "<div class=\"message user\"><strong>You:</strong> {}</div>\n",
            escape_html(message)
        ));
    }
    if let Some(answer) = answer {
        conversation.push_str(&format!(
            "<div class=\"message bot\"><strong>Advisor:</strong> {}</div>\n",
            escape_html(answer)
        ));
    }
    if let Some(error) = error {
        conversation.push_str(&format!("<div class=\"message error\">{}</div>\n", escape_html(error)));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Camp Weather Expert</title>
<style>
body {{ font-family: sans-serif; max-width: 640px; margin: 40px auto; }}
.message {{ padding: 8px 12px; margin: 8px 0; border-radius: 6px; white-space: pre-wrap; }}
.user {{ background: #e8f0fe; }}
.bot {{ background: #e6f4ea; }}
.error {{ background: #fce8e6; }}
</style>
</head>
<body>
<h1>Camp Weather Expert</h1>
{conversation}<form method="post" action="/">
<input type="text" name="message" placeholder="Is Hualien good for camping this weekend?" size="50" required>
<button type="submit">Ask</button>
</form>
</body>
</html>
"#
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
