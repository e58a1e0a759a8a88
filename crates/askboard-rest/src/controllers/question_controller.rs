//! Question controller.

use crate::{
    extractors::{ValidatedJson, ViewerKey},
    responses::{created, ok, ApiResponse, ApiResult, AppError, MessageResponse},
    state::AppState,
};
use askboard_core::{AskError, Comment, QuestionId};
use askboard_service::{
    AddCommentRequest, CreateQuestionRequest, CreatedQuestionResponse, QuestionListResponse,
    QuestionResponse, UpdateQuestionRequest,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::debug;

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

/// Creates the question router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        .route("/:id", get(get_question).put(update_question))
        .route("/:id/comments", post(add_comment))
        .route("/:id/like", post(like_question))
}

/// List the most recent questions.
async fn list_questions(State(state): State<AppState>) -> ApiResult<QuestionListResponse> {
    debug!("List questions request");

    let response = state.question_service.list_questions().await?;
    ok(response)
}

/// Get a question with tags, comments, and counts.
async fn get_question(
    State(state): State<AppState>,
    viewer: ViewerKey,
    Path(id): Path<String>,
) -> ApiResult<QuestionResponse> {
    debug!("Get question request: {}", id);

    let question_id = parse_question_id(&id)?;
    let response = state
        .question_service
        .get_question(question_id, viewer.as_str())
        .await?;
    ok(response)
}

/// Create a question.
async fn create_question(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateQuestionRequest>,
) -> Result<Created<CreatedQuestionResponse>, AppError> {
    debug!("Create question request: {}", request.title);

    let id = state.question_service.create_question(request).await?;
    Ok(created(CreatedQuestionResponse { id }))
}

/// Edit a question.
async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateQuestionRequest>,
) -> ApiResult<MessageResponse> {
    debug!("Update question request: {}", id);

    let question_id = parse_question_id(&id)?;
    state
        .question_service
        .update_question(question_id, request)
        .await?;
    ok(MessageResponse::new("Question updated successfully"))
}

/// Comment on a question.
async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<AddCommentRequest>,
) -> Result<Created<Comment>, AppError> {
    debug!("Add comment request: {}", id);

    let question_id = parse_question_id(&id)?;
    let comment = state
        .question_service
        .add_comment(question_id, request)
        .await?;
    Ok(created(comment))
}

/// Like a question.
async fn like_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    debug!("Like question request: {}", id);

    let question_id = parse_question_id(&id)?;
    state.question_service.like_question(question_id).await?;
    ok(MessageResponse::new("Question liked successfully"))
}

/// Helper to parse a question ID from a path parameter.
fn parse_question_id(id: &str) -> Result<QuestionId, AppError> {
    match QuestionId::parse(id) {
        Ok(question_id) if question_id.into_inner() > 0 => Ok(question_id),
        _ => Err(AppError(AskError::validation(format!(
            "Invalid question ID: {}",
            id
        )))),
    }
}
