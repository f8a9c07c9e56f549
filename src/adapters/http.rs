//! JSON REST surface of the trivia service.
//!
//! Every error leaves as `{"success": false, "error": <status>, "message": ...}`,
//! including extractor rejections, unknown routes and wrong methods.

use crate::core::service::TriviaService;
use crate::domain::model::{category_map, CategoryId, NewQuestion, QuestionId, QuestionPatch};
use crate::domain::ports::QuestionStore;
use crate::utils::error::{Result, TriviaError};
use crate::utils::validation::validate_required_field;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal::{self, ctrl_c};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

type Shared<S> = State<Arc<TriviaService<S>>>;

fn status_of(error: &TriviaError) -> StatusCode {
    match error {
        TriviaError::CategoryNotFound { .. }
        | TriviaError::QuestionNotFound { .. }
        | TriviaError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
        TriviaError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        TriviaError::PageOutOfRange { .. } | TriviaError::BadRequest { .. } => {
            StatusCode::BAD_REQUEST
        }
        TriviaError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reason_of(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad request",
        StatusCode::NOT_FOUND => "resource not found",
        StatusCode::METHOD_NOT_ALLOWED => "method not allowed",
        StatusCode::UNPROCESSABLE_ENTITY => "unprocessable",
        _ => "internal server error",
    }
}

impl IntoResponse for TriviaError {
    fn into_response(self) -> Response {
        let status = status_of(&self);

        let body = if status.is_server_error() {
            tracing::error!("❌ Request failed: {} ({:?})", self, self.severity());
            json!({
                "success": false,
                "error": status.as_u16(),
                "message": reason_of(status),
            })
        } else {
            tracing::debug!("Client error {}: {}", status.as_u16(), self);
            json!({
                "success": false,
                "error": status.as_u16(),
                "message": reason_of(status),
                "detail": self.to_string(),
            })
        };

        (status, Json(body)).into_response()
    }
}

/// Ids arrive as numbers from API clients and as strings from the web form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FlexibleId {
    Number(i64),
    Text(String),
}

impl FlexibleId {
    pub fn value(&self, field: &str) -> Result<i64> {
        match self {
            FlexibleId::Number(n) => Ok(*n),
            FlexibleId::Text(text) => text.trim().parse().map_err(|_| {
                TriviaError::bad_request(format!("{} must be an integer, got '{}'", field, text))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum QuizCategory {
    Id(FlexibleId),
    /// The web client's `{"type": ..., "id": ...}` form; only the id matters.
    Object { id: FlexibleId },
}

impl QuizCategory {
    /// 0 代表所有類別
    fn filter(&self) -> Result<Option<CategoryId>> {
        let id = match self {
            QuizCategory::Id(id) => id.value("quiz_category")?,
            QuizCategory::Object { id, .. } => id.value("quiz_category.id")?,
        };
        Ok((id != 0).then_some(id))
    }
}

#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub previous_questions: Vec<QuestionId>,
    #[serde(default)]
    pub quiz_category: Option<QuizCategory>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// `POST /questions` 同時負責搜尋與新增
#[derive(Debug, Default, Deserialize)]
pub struct QuestionsRequest {
    #[serde(default, alias = "searchTerm")]
    pub search_term: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<FlexibleId>,
    pub difficulty: Option<FlexibleId>,
}

fn required<'a, T>(field: &str, value: &'a Option<T>) -> Result<&'a T> {
    validate_required_field(field, value)
        .map_err(|_| TriviaError::bad_request(format!("missing field '{}'", field)))
}

impl QuestionsRequest {
    fn into_new_question(self) -> Result<NewQuestion> {
        Ok(NewQuestion {
            question: required("question", &self.question)?.clone(),
            answer: required("answer", &self.answer)?.clone(),
            category: required("category", &self.category)?.value("category")?,
            difficulty: required("difficulty", &self.difficulty)?.value("difficulty")?,
        })
    }
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| TriviaError::bad_request(rejection.body_text()))
}

fn path_id(id: std::result::Result<Path<i64>, PathRejection>, uri: &Uri) -> Result<i64> {
    id.map(|Path(id)| id)
        .map_err(|_| TriviaError::ResourceNotFound {
            path: uri.path().to_string(),
        })
}

async fn list_categories<S: QuestionStore>(State(service): Shared<S>) -> Result<Json<Value>> {
    let categories = service.categories().await?;
    Ok(Json(json!({
        "success": true,
        "categories": category_map(&categories),
    })))
}

async fn list_questions<S: QuestionStore>(
    State(service): Shared<S>,
    query: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query.map_err(|rejection| TriviaError::bad_request(rejection.body_text()))?;
    let page = service.questions_page(query.page.unwrap_or(1)).await?;

    Ok(Json(json!({
        "success": true,
        "questions": page.questions,
        "total_questions": page.total_questions,
        "categories": page.categories,
        "current_category": null,
    })))
}

async fn search_or_create_question<S: QuestionStore>(
    State(service): Shared<S>,
    payload: std::result::Result<Json<QuestionsRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let request = json_body(payload)?;

    if let Some(term) = &request.search_term {
        let questions = service.search(term).await?;
        return Ok(Json(json!({
            "success": true,
            "total_questions": questions.len(),
            "questions": questions,
            "current_category": null,
        })));
    }

    let created = service.create_question(request.into_new_question()?).await?;
    let total_questions = service.total_questions().await?;
    Ok(Json(json!({
        "success": true,
        "created": created.id,
        "total_questions": total_questions,
    })))
}

async fn update_question<S: QuestionStore>(
    State(service): Shared<S>,
    uri: Uri,
    id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<QuestionPatch>, JsonRejection>,
) -> Result<Json<Value>> {
    let id = path_id(id, &uri)?;
    let question = service.update_question(id, json_body(payload)?).await?;
    Ok(Json(json!({
        "success": true,
        "question": question,
    })))
}

async fn delete_question<S: QuestionStore>(
    State(service): Shared<S>,
    uri: Uri,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>> {
    let deleted = service.delete_question(path_id(id, &uri)?).await?;
    Ok(Json(json!({
        "success": true,
        "deleted": deleted,
    })))
}

async fn category_questions<S: QuestionStore>(
    State(service): Shared<S>,
    uri: Uri,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>> {
    let listing = service.questions_by_category(path_id(id, &uri)?).await?;
    Ok(Json(json!({
        "success": true,
        "questions": listing.questions,
        "total_questions": listing.total_questions,
        "current_category": listing.current_category,
    })))
}

async fn next_quiz_question<S: QuestionStore>(
    State(service): Shared<S>,
    payload: std::result::Result<Json<QuizRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let request = json_body(payload)?;
    let category = match &request.quiz_category {
        Some(category) => category.filter()?,
        None => None,
    };

    let outcome = service
        .next_quiz_question(category, &request.previous_questions)
        .await?;
    Ok(Json(json!({
        "success": true,
        "question": outcome.into_question(),
    })))
}

async fn not_found(uri: Uri) -> TriviaError {
    TriviaError::ResourceNotFound {
        path: uri.path().to_string(),
    }
}

async fn method_not_allowed() -> TriviaError {
    TriviaError::MethodNotAllowed
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

pub fn router<S: QuestionStore + 'static>(service: TriviaService<S>) -> Router {
    let state = Arc::new(service);

    Router::new()
        .route("/categories", get(list_categories::<S>))
        .route(
            "/categories/{id}/questions",
            get(category_questions::<S>),
        )
        .route(
            "/questions",
            get(list_questions::<S>).post(search_or_create_question::<S>),
        )
        .route(
            "/questions/{id}",
            patch(update_question::<S>).delete(delete_question::<S>),
        )
        .route("/quizzes", post(next_quiz_question::<S>))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 綁定位址，回傳實際的 listener（port 0 時由系統分配）
pub async fn bind(address: &str) -> Result<TcpListener> {
    tracing::info!("Binding to {address}");
    Ok(TcpListener::bind(address).await?)
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    if let Ok(address) = listener.local_addr() {
        tracing::info!("🚀 Trivia API running on http://{address}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
