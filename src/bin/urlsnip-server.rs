use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing,
};
use rearch::Container;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};
use urlsnip::{
    config,
    url_service::{self, CreateShortUrlError, ResolveUrlError, url_shorten_service_capsule},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let container = config::init_container().await?;

    let app = Router::new()
        .route("/", routing::post(create_url))
        .route("/{token}", routing::get(resolve_url))
        .with_state(container.clone());

    let listener = TcpListener::bind(container.read(config::addr_capsule)).await?;
    info!(addr = %listener.local_addr()?, "Started listening on TCP");
    axum::serve(listener, app).await?;
    Ok(())
}

#[instrument(skip(container))]
async fn create_url(
    State(container): State<Container>,
    Json(url_service::CreateUrlPayload { url }): Json<url_service::CreateUrlPayload>,
) -> impl IntoResponse {
    container
        .read(url_shorten_service_capsule)
        .create_short_url(&url)
        .await
        .map(|token| Json(url_service::ShortenedUrl { token }))
        .map_err(|error: CreateShortUrlError| {
            let err_uuid = Uuid::new_v4();
            match error {
                CreateShortUrlError::Validation(validation_error) => {
                    info!(?err_uuid, %validation_error, "User submitted a bad request");
                    (
                        StatusCode::BAD_REQUEST,
                        Json(Error {
                            error: validation_error.to_string(),
                            error_id: err_uuid.to_string(),
                        }),
                    )
                }
                CreateShortUrlError::Db(db_err) => {
                    error!(?err_uuid, ?db_err, "Encountered database error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(Error {
                            error: "Internal server error".to_owned(),
                            error_id: err_uuid.to_string(),
                        }),
                    )
                }
            }
        })
}

#[instrument(skip(container))]
async fn resolve_url(
    State(container): State<Container>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    container
        .read(url_shorten_service_capsule)
        .resolve_url(&token)
        .await
        .map(|url| Redirect::temporary(&url))
        .map_err(|error: ResolveUrlError| {
            let err_uuid = Uuid::new_v4();
            match error {
                ResolveUrlError::NotFound => (
                    StatusCode::NOT_FOUND,
                    Json(Error {
                        error: "Not found".to_owned(),
                        error_id: err_uuid.to_string(),
                    }),
                ),
                ResolveUrlError::Db(db_err) => {
                    error!(?err_uuid, ?db_err, "Encountered database error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(Error {
                            error: "Internal server error".to_owned(),
                            error_id: err_uuid.to_string(),
                        }),
                    )
                }
            }
        })
}

#[derive(Serialize)]
struct Error {
    error: String,
    error_id: String,
}
