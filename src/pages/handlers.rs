use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use tracing::{info, instrument, warn};

use super::views::{self, AnalysisView, PageView, REPORT_FILE_NAME};
use crate::{
    analysis::{analyze, build_prompt, encode_png_blocking, prepare_image, PortionSize, Upload},
    error::{AppError, AppResult},
    history::MealTime,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/history/:id/report", get(download_report))
        .route("/history/:id/image", get(history_image))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze_meal))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

struct AnalyzeForm {
    meal_time: MealTime,
    portion: PortionSize,
    upload: Option<Upload>,
}

async fn read_form(mut mp: Multipart) -> AppResult<AnalyzeForm> {
    let mut form = AnalyzeForm {
        meal_time: MealTime::default(),
        portion: PortionSize::default(),
        upload: None,
    };
    while let Some(field) = mp.next_field().await.map_err(bad_request)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("meal_time") => {
                let value = field.text().await.map_err(bad_request)?;
                form.meal_time = value.parse().map_err(bad_request)?;
            }
            Some("portion_size") => {
                let value = field.text().await.map_err(bad_request)?;
                form.portion = value.parse().map_err(bad_request)?;
            }
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let body = field.bytes().await.map_err(bad_request)?;
                form.upload = Some(Upload {
                    file_name,
                    content_type,
                    body,
                });
            }
            _ => {}
        }
    }
    Ok(form)
}

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    let history = state.history.list_all().await?;
    Ok(Html(views::render_page(&PageView {
        history: &history,
        meal_time: MealTime::default(),
        portion: PortionSize::default(),
        analysis: None,
        error: None,
        model_name: &state.config.gemini.model,
    })))
}

/// Runs one analysis: validates the upload, calls the model, records the
/// outcome (success or error text alike) and renders it with the history.
#[instrument(skip(state, mp))]
pub async fn analyze_meal(
    State(state): State<AppState>,
    mp: Multipart,
) -> AppResult<(StatusCode, Html<String>)> {
    let form = read_form(mp).await?;

    let part = match prepare_image(form.upload) {
        Ok(part) => part,
        Err(e) => {
            warn!(error = %e, "analysis requested without a file");
            return rejected(&state, form.meal_time, form.portion, e.to_string()).await;
        }
    };
    let png = match encode_png_blocking(part.data.clone()).await {
        Ok(png) => png,
        Err(e) => {
            warn!(
                error = %format!("{e:#}"),
                mime = %part.mime_type,
                "upload is not a readable image"
            );
            return rejected(&state, form.meal_time, form.portion, format!("{e:#}")).await;
        }
    };

    let prompt = build_prompt(form.portion);
    let outcome = analyze(state.model.as_ref(), &prompt, &part).await;

    let entry_id = state
        .history
        .append(form.meal_time.as_str(), &outcome.text, &png)
        .await?;
    info!(
        entry_id,
        meal_time = %form.meal_time,
        portion = %form.portion,
        ok = outcome.ok,
        "analysis recorded"
    );

    let history = state.history.list_all().await?;
    let page = views::render_page(&PageView {
        history: &history,
        meal_time: form.meal_time,
        portion: form.portion,
        analysis: Some(AnalysisView { entry_id, outcome }),
        error: None,
        model_name: &state.config.gemini.model,
    });
    Ok((StatusCode::OK, Html(page)))
}

#[instrument(skip(state))]
pub async fn download_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let entry = state.history.get(id).await?.ok_or(AppError::NotFound)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{REPORT_FILE_NAME}\""),
            ),
        ],
        entry.calorie_report,
    ))
}

#[instrument(skip(state))]
pub async fn history_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let entry = state.history.get(id).await?.ok_or(AppError::NotFound)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], entry.image))
}

/// Re-renders the page with an inline error; nothing is analyzed or stored.
async fn rejected(
    state: &AppState,
    meal_time: MealTime,
    portion: PortionSize,
    reason: String,
) -> AppResult<(StatusCode, Html<String>)> {
    let history = state.history.list_all().await?;
    let page = views::render_page(&PageView {
        history: &history,
        meal_time,
        portion,
        analysis: None,
        error: Some(format!("Error processing image: {reason}")),
        model_name: &state.config.gemini.model,
    });
    Ok((StatusCode::BAD_REQUEST, Html(page)))
}

fn bad_request<E: std::fmt::Display>(e: E) -> AppError {
    AppError::BadRequest(e.to_string())
}
