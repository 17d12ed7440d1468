use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::{ApplicationError, ApplicationForm, ApplicationService, MailRelay};

/// Router exposing the application form endpoint.
pub fn application_router<M>(service: Arc<ApplicationService<M>>) -> Router
where
    M: MailRelay + 'static,
{
    Router::new()
        .route("/api/contact", post(submit_handler::<M>))
        .with_state(service)
}

pub(crate) async fn submit_handler<M>(
    State(service): State<Arc<ApplicationService<M>>>,
    payload: Result<Json<ApplicationForm>, JsonRejection>,
) -> Response
where
    M: MailRelay + 'static,
{
    let Json(form) = match payload {
        Ok(form) => form,
        Err(rejection) => {
            let payload = json!({ "error": rejection.body_text() });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    match service.submit(&form, Utc::now()).await {
        Ok(_) => {
            let payload = json!({ "message": "Form submitted successfully" });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error @ ApplicationError::Invalid(_)) => {
            let payload = json!({ "error": error.public_message() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({ "error": error.public_message() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
