use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use ringi_core::domain::application::{Application, ApplicationCodeId, ApplicationId};
use ringi_core::domain::history::ApprovalHistoryEntry;
use ringi_core::domain::route::{ApprovalRoute, RouteId};
use ringi_core::errors::{InterfaceError, WorkflowError};
use ringi_db::repositories::{
    SqlActivityLogRepository, SqlApplicationRepository, SqlHistoryRepository, SqlRouteRepository,
};
use ringi_db::{DbPool, SubmitApplication, WorkflowEngine};

pub type SqlWorkflowEngine = WorkflowEngine<
    SqlApplicationRepository,
    SqlRouteRepository,
    SqlHistoryRepository,
    SqlActivityLogRepository,
>;

#[derive(Clone)]
pub struct ApiState {
    engine: Arc<SqlWorkflowEngine>,
}

pub fn router(pool: DbPool) -> Router {
    let engine = Arc::new(WorkflowEngine::new(
        SqlApplicationRepository::new(pool.clone()),
        SqlRouteRepository::new(pool.clone()),
        SqlHistoryRepository::new(pool.clone()),
        SqlActivityLogRepository::new(pool),
    ));

    Router::new()
        .route("/applications", post(submit_application).get(list_applications))
        .route("/applications/{id}", get(get_application))
        .route("/applications/{id}/history", get(get_application_history))
        .route("/applications/{id}/approve", post(approve_application))
        .route("/applications/{id}/reject", post(reject_application))
        .route("/applications/{id}/cancel", post(cancel_application))
        .route("/routes", get(list_routes))
        .with_state(ApiState { engine })
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub applicant_id: String,
    pub application_code_id: String,
    pub form_data: Value,
    pub approval_route_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub acting_user_id: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub acting_user_id: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub acting_user_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub applicant_id: Option<String>,
    pub approver_id: Option<String>,
}

/// `message` carries the workflow error verbatim for the forms to display;
/// `hint` is the generic user-safe variant.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub hint: &'static str,
    pub correlation_id: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(error: WorkflowError) -> ApiError {
    let correlation_id = Uuid::new_v4().to_string();
    tracing::error!(
        event_name = "api.workflow_request_failed",
        correlation_id = %correlation_id,
        error = %error,
        "workflow request failed"
    );

    let message = error.to_string();
    let interface = error.into_interface(correlation_id.clone());
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(ErrorResponse { message, hint: interface.user_message(), correlation_id }))
}

fn not_found(application_id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: format!("application `{application_id}` not found"),
            hint: "The requested application does not exist.",
            correlation_id: Uuid::new_v4().to_string(),
        }),
    )
}

async fn submit_application(
    State(state): State<ApiState>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<Application>), ApiError> {
    let application = state
        .engine
        .submit(SubmitApplication {
            applicant_id: request.applicant_id,
            application_code_id: ApplicationCodeId(request.application_code_id),
            form_data: request.form_data,
            approval_route_id: RouteId(request.approval_route_id),
        })
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(application)))
}

async fn approve_application(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<ApproveRequest>,
) -> Result<Json<Application>, ApiError> {
    let application = state
        .engine
        .approve(&ApplicationId(id), &request.acting_user_id, &request.comment)
        .await
        .map_err(error_response)?;

    Ok(Json(application))
}

async fn reject_application(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<Application>, ApiError> {
    let application = state
        .engine
        .reject(&ApplicationId(id), &request.reason, &request.acting_user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(application))
}

async fn cancel_application(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<Application>, ApiError> {
    let application = state
        .engine
        .cancel(&ApplicationId(id), &request.acting_user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(application))
}

async fn get_application(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Application>, ApiError> {
    let application = state
        .engine
        .find_application(&ApplicationId(id.clone()))
        .await
        .map_err(error_response)?;

    application.map(Json).ok_or_else(|| not_found(&id))
}

async fn get_application_history(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ApprovalHistoryEntry>>, ApiError> {
    let entries = state
        .engine
        .application_history(&ApplicationId(id))
        .await
        .map_err(error_response)?;

    Ok(Json(entries))
}

async fn list_applications(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Application>>, ApiError> {
    let applications = match (query.applicant_id, query.approver_id) {
        (Some(applicant_id), None) => {
            state.engine.applications_for_applicant(&applicant_id).await
        }
        (None, Some(approver_id)) => state.engine.pending_for_approver(&approver_id).await,
        _ => {
            return Err(error_response(WorkflowError::Validation(
                "exactly one of `applicant_id` or `approver_id` is required".to_string(),
            )))
        }
    }
    .map_err(error_response)?;

    Ok(Json(applications))
}

async fn list_routes(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ApprovalRoute>>, ApiError> {
    let routes = state.engine.routes().await.map_err(error_response)?;
    Ok(Json(routes))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use ringi_core::domain::route::{ApprovalRoute, RouteId, RouteStep};
    use ringi_db::repositories::{RouteRepository, SqlRouteRepository};
    use ringi_db::{connect_with_settings, migrations};

    async fn test_router() -> Router {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let routes = SqlRouteRepository::new(pool.clone());
        routes
            .save(ApprovalRoute {
                id: RouteId("route-1".to_string()),
                name: "経費精算ルート".to_string(),
                steps: vec![
                    RouteStep { approver_id: "user-a".to_string() },
                    RouteStep { approver_id: "user-b".to_string() },
                ],
                created_at: Utc::now(),
            })
            .await
            .expect("seed route");

        super::router(pool)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn submit_approve_approve_runs_the_route_to_completion() {
        let router = test_router().await;

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/applications",
                json!({
                    "applicant_id": "user-applicant",
                    "application_code_id": "expense",
                    "form_data": {"amount": 12800},
                    "approval_route_id": "route-1",
                }),
            ))
            .await
            .expect("submit");
        assert_eq!(response.status(), StatusCode::CREATED);

        let submitted = response_json(response).await;
        let application_id = submitted["id"].as_str().expect("id").to_string();
        assert_eq!(submitted["status"], "pending_approval");
        assert_eq!(submitted["current_level"], 1);
        assert_eq!(submitted["approver_id"], "user-a");

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/applications/{application_id}/approve"),
                json!({"acting_user_id": "user-a"}),
            ))
            .await
            .expect("intermediate approve");
        assert_eq!(response.status(), StatusCode::OK);
        let intermediate = response_json(response).await;
        assert_eq!(intermediate["current_level"], 2);
        assert_eq!(intermediate["approver_id"], "user-b");

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/applications/{application_id}/approve"),
                json!({"acting_user_id": "user-b", "comment": "最終承認"}),
            ))
            .await
            .expect("final approve");
        assert_eq!(response.status(), StatusCode::OK);
        let approved = response_json(response).await;
        assert_eq!(approved["status"], "approved");
        assert_eq!(approved["approver_id"], Value::Null);

        let response = router
            .oneshot(
                Request::builder()
                    .uri(format!("/applications/{application_id}/history"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("history");
        assert_eq!(response.status(), StatusCode::OK);
        let history = response_json(response).await;
        let actions: Vec<&str> = history
            .as_array()
            .expect("entries")
            .iter()
            .map(|entry| entry["action"].as_str().expect("action"))
            .collect();
        assert_eq!(actions, vec!["submitted", "approved", "approved"]);
    }

    #[tokio::test]
    async fn blank_rejection_reason_is_a_bad_request() {
        let router = test_router().await;

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/applications",
                json!({
                    "applicant_id": "user-applicant",
                    "application_code_id": "leave",
                    "form_data": {"days": 1},
                    "approval_route_id": "route-1",
                }),
            ))
            .await
            .expect("submit");
        let submitted = response_json(response).await;
        let application_id = submitted["id"].as_str().expect("id").to_string();

        let response = router
            .oneshot(json_request(
                "POST",
                &format!("/applications/{application_id}/reject"),
                json!({"acting_user_id": "user-a", "reason": "   "}),
            ))
            .await
            .expect("reject");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response_json(response).await;
        assert!(body["message"].as_str().expect("message").contains("rejection reason"));
        assert!(body["correlation_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn unknown_application_returns_not_found() {
        let router = test_router().await;

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/applications/app-missing")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("get");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_requires_exactly_one_filter() {
        let router = test_router().await;

        let response = router
            .oneshot(Request::builder().uri("/applications").body(Body::empty()).expect("request"))
            .await
            .expect("list");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn routes_listing_exposes_the_registry() {
        let router = test_router().await;

        let response = router
            .oneshot(Request::builder().uri("/routes").body(Body::empty()).expect("request"))
            .await
            .expect("routes");
        assert_eq!(response.status(), StatusCode::OK);

        let routes = response_json(response).await;
        assert_eq!(routes.as_array().expect("routes").len(), 1);
        assert_eq!(routes[0]["name"], "経費精算ルート");
        assert_eq!(routes[0]["steps"].as_array().expect("steps").len(), 2);
    }
}
