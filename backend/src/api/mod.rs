pub mod identity;

use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{get, post, put};
use axum::{Router, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub use identity::{CurrentUser, USER_ID_HEADER};

#[derive(Deserialize)]
struct AssignmentQueryParams {
    #[serde(default)]
    days: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/assignments", get(list_assignments).post(create_assignment))
        .route(
            "/assignments/{id}",
            get(get_assignment).patch(update_assignment).delete(delete_assignment),
        )
        .route("/assignments/{id}/done", put(set_assignment_done))
        .route("/courses/active", get(active_courses))
        .route("/courses/search/{term}", get(search_courses))
        .route("/courses/{course_id}/assignments", get(course_assignments))
        .route("/courses/stats", get(course_stats))
        .route("/courses/cache", post(refresh_cache).delete(invalidate_cache))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn create_assignment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateAssignmentRequest>,
) -> Result<Json<Assignment>, AppError> {
    let assignment = state.assignments().create(&user_id, req.try_into()?).await?;
    Ok(Json(assignment))
}

async fn list_assignments(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<AssignmentQueryParams>,
) -> Result<Json<Vec<Assignment>>, AppError> {
    let assignments = state
        .assignments()
        .list_by_creator(&user_id, params.days)
        .await?;
    Ok(Json(assignments))
}

async fn get_assignment(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Assignment>, AppError> {
    let assignment = state.assignments().get(&id).await?;
    Ok(Json(assignment))
}

async fn update_assignment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateAssignmentRequest>,
) -> Result<Json<Assignment>, AppError> {
    let assignment = state.assignments().update(&user_id, &id, req).await?;
    Ok(Json(assignment))
}

async fn delete_assignment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Assignment>, AppError> {
    let assignment = state.assignments().delete(&user_id, &id).await?;
    Ok(Json(assignment))
}

async fn set_assignment_done(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<SetDoneRequest>,
) -> Result<Json<Assignment>, AppError> {
    let assignment = state.assignments().set_done(&id, &user_id, req.done).await?;
    Ok(Json(assignment))
}

async fn active_courses(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.courses().active_courses(&user_id).await?;
    Ok(Json(courses))
}

async fn search_courses(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(term): Path<String>,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.courses().search(&user_id, &term).await?;
    Ok(Json(courses))
}

async fn course_assignments(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(course_id): Path<i64>,
) -> Result<Json<Vec<Assignment>>, AppError> {
    let assignments = state
        .assignments()
        .list_by_course(&user_id, CourseId::from(course_id))
        .await?;
    Ok(Json(assignments))
}

async fn course_stats(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<CourseStat>>, AppError> {
    let stats = state.courses().course_stats(&user_id).await?;
    Ok(Json(stats))
}

async fn refresh_cache(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<RefreshCacheRequest>,
) -> Result<StatusCode, AppError> {
    if req.lms_url.trim().is_empty() {
        return Err(AppError::BadRequest("lms_url must not be empty".to_string()));
    }
    state
        .courses()
        .refresh_cache(&user_id, &req.lms_url, req.courses)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn invalidate_cache(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<StatusCode, AppError> {
    state.courses().invalidate_cache(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
