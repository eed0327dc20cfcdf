use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::ingest::Stage;
use crate::ingest::extract::RawSubmission;
use crate::ingest::response::assemble;
use crate::models::component::{ComponentForm, ComponentIngestResponse};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Components",
    operation_id = "addComponent",
    summary = "Add a component with evidence files",
    description = "Creates a component row from the plain form fields and uploads the files \
        posted under `category{n}_files` into per-category folders. Each file gets an evidence \
        row; files whose upload failed are recorded with a `pending-upload/` URL. Partial upload \
        or evidence failures are reported inline with a 201.",
    request_body(content = ComponentForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Component created", body = ComponentIngestResponse),
        (status = 400, description = "Missing or invalid fields (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Component could not be stored (PERSISTENCE_ERROR, INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
pub async fn add_component(
    State(state): State<AppState>,
    submission: RawSubmission,
) -> Result<(StatusCode, Json<ComponentIngestResponse>), AppError> {
    let request_id = Uuid::now_v7();
    let span = info_span!("ingest", %request_id);
    let pipeline = state.pipeline.clone();

    // Runs detached so a client disconnect cannot leave the stores half written.
    let task = async move { pipeline.run(submission).await }.instrument(span.clone());
    let report = tokio::spawn(task)
        .await
        .map_err(|e| AppError::Internal(format!("ingest task failed: {e}")))??;

    let response = assemble(report);
    span.in_scope(|| {
        info!(
            stage = %Stage::Responded,
            component_id = response.data.component.id,
            "Component submission completed"
        )
    });
    Ok((StatusCode::CREATED, Json(response)))
}
