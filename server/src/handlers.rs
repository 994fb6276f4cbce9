use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use imagepost_core::cache_key::http_date;
use imagepost_core::config::RenderConfig;
use imagepost_core::{
    render_encoded, ImageKind, MediaEntity, ProcessingError, RenderOutcome, RenderRequest,
    Rendered,
};

use crate::AppState;

const X_IMAGE_PROCESSOR: &str = "x-image-processor";

#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessorInfo {
    name: String,
    requires_transparency: bool,
    configuration_last_modified: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CacheKeyInfo {
    key: String,
    etag: String,
    processor: Option<String>,
    last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CacheKeyQuery {
    entity: Option<Uuid>,
    #[serde(default)]
    kind: ImageKind,
    #[serde(default)]
    index: u32,
}

/// GET /processors
///
/// Registered processors in priority order.
pub async fn processors(State(state): State<Arc<AppState>>) -> Response {
    let list: Vec<ProcessorInfo> = state
        .pipeline
        .processors()
        .map(|p| ProcessorInfo {
            name: p.name().to_string(),
            requires_transparency: p.requires_transparency(),
            configuration_last_modified: p.configuration_last_modified(),
        })
        .collect();

    Json(ApiResponse::ok(list)).into_response()
}

/// GET /cache-key?entity=<uuid>&kind=<kind>&index=<n>
///
/// Cache key for an image without rendering it.
pub async fn cache_key(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CacheKeyQuery>,
) -> Response {
    let entity = query.entity.map(MediaEntity::new);
    let key = state
        .pipeline
        .cache_key(entity.as_ref(), query.kind, query.index);

    let info = CacheKeyInfo {
        key: key.canonical(),
        etag: key.etag(),
        processor: key.processor.as_ref().map(|p| p.name.clone()),
        last_modified: key.last_modified(),
    };

    Json(ApiResponse::ok(info)).into_response()
}

/// POST /render
///
/// Resize an uploaded image and run it through the registered processors.
///
/// Form fields:
/// - file: binary image data (PNG, JPEG, WebP, ...)
/// - entity (optional): owning entity id
/// - kind (optional): image kind (default: primary)
/// - index (optional): image index (default: 0)
/// - width / height (optional): target bounds in pixels
/// - quality (optional): 1-100 for lossy output (default: 85)
pub async fn render(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, StatusCode> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut entity: Option<Uuid> = None;
    let mut kind = ImageKind::Primary;
    let mut index = 0u32;
    let mut config = state.config.clone();

    // Parse multipart form
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(_) => return Err(StatusCode::BAD_REQUEST),
        };

        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                if !is_image_upload(field.content_type()) {
                    return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
                }
                let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                file_data = Some(bytes.to_vec());
            }
            "entity" => {
                let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                entity = Some(text.trim().parse().map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            "kind" => {
                let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                kind = text.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
            }
            "index" => {
                let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                index = text.trim().parse().map_err(|_| StatusCode::BAD_REQUEST)?;
            }
            "width" => {
                let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                config.width = Some(text.trim().parse().map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            "height" => {
                let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                config.height = Some(text.trim().parse().map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            "quality" => {
                let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                config.quality = match text.trim().parse::<u8>() {
                    Ok(quality @ 1..=100) => quality,
                    _ => return Err(StatusCode::BAD_REQUEST),
                };
            }
            _ => {}
        }
    }

    let data = file_data.ok_or(StatusCode::BAD_REQUEST)?;

    let worker_state = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        let entity = entity.map(MediaEntity::new);
        render_blocking(&worker_state, &data, &config, entity.as_ref(), kind, index)
    })
    .await
    .map_err(|e| {
        log::error!("Render task failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match result {
        Ok(rendered) => image_response(rendered),
        Err(e) => {
            log::warn!("Render rejected: {}", e);
            let status = match e {
                ProcessingError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ProcessingError::InvalidDimensions { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Ok((status, Json(ApiResponse::<()>::error(e.to_string()))).into_response())
        }
    }
}

fn render_blocking(
    state: &AppState,
    data: &[u8],
    config: &RenderConfig,
    entity: Option<&MediaEntity>,
    kind: ImageKind,
    index: u32,
) -> Result<Rendered, ProcessingError> {
    let request = RenderRequest {
        entity,
        kind,
        index,
    };
    render_encoded(&state.pipeline, data, config, request)
}

/// Uploads without a declared type are sniffed by the decoder.
fn is_image_upload(content_type: Option<&str>) -> bool {
    let Some(declared) = content_type else {
        return true;
    };
    match declared.parse::<mime::Mime>() {
        Ok(m) => m.type_() == mime::IMAGE || m == mime::APPLICATION_OCTET_STREAM,
        Err(_) => false,
    }
}

fn image_response(rendered: Rendered) -> Result<Response, StatusCode> {
    let header_value =
        |value: &str| HeaderValue::from_str(value).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(rendered.format.mime_type()),
    );
    headers.insert(header::ETAG, header_value(&rendered.cache_key.etag())?);

    match &rendered.outcome {
        RenderOutcome::Processed { processor } => {
            headers.insert(
                HeaderName::from_static(X_IMAGE_PROCESSOR),
                header_value(processor)?,
            );
            if let Some(at) = rendered.cache_key.last_modified() {
                headers.insert(header::LAST_MODIFIED, header_value(&http_date(at))?);
            }
        }
        RenderOutcome::Recovered { .. } => {
            // The bytes do not match the key; keep them out of caches
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        }
        RenderOutcome::Unprocessed => {}
    }

    Ok((StatusCode::OK, headers, rendered.bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use image::{Rgba, RgbaImage};
    use imagepost_core::{Pipeline, RoundedCornerProcessor};
    use std::io::Cursor;
    use tower::ServiceExt;

    const BOUNDARY: &str = "imagepost-test-boundary";

    fn state() -> Arc<AppState> {
        let mut pipeline = Pipeline::new();
        pipeline.register(Box::new(RoundedCornerProcessor::new()));
        Arc::new(AppState {
            pipeline,
            config: RenderConfig::default(),
        })
    }

    fn red_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    fn multipart(file: Option<&[u8]>, fields: &[(&str, &str)]) -> Request<Body> {
        let mut body = Vec::new();
        if let Some(file) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(file);
            body.extend_from_slice(b"\r\n");
        }
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/render")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn lists_registered_processors() {
        let response = app(state())
            .oneshot(Request::get("/processors").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"][0]["name"], "rounded-corners");
        assert_eq!(json["data"][0]["requires_transparency"], true);
    }

    #[tokio::test]
    async fn cache_key_matches_pipeline() {
        let state = state();
        let expected = state.pipeline.cache_key(None, ImageKind::Backdrop, 2).etag();

        let response = app(state)
            .oneshot(
                Request::get("/cache-key?kind=backdrop&index=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["etag"], expected);
        assert_eq!(json["data"]["processor"], "rounded-corners");
    }

    #[tokio::test]
    async fn unknown_kind_in_query_is_rejected() {
        let response = app(state())
            .oneshot(Request::get("/cache-key?kind=poster").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn render_returns_png_with_cache_headers() {
        let png = red_png(200, 200);
        let response = app(state())
            .oneshot(multipart(
                Some(&png),
                &[("kind", "backdrop"), ("width", "100"), ("height", "100")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
        assert!(headers.contains_key(header::ETAG));
        assert!(headers.contains_key(header::LAST_MODIFIED));
        assert_eq!(headers["x-image-processor"], "rounded-corners");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (100, 100));
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(*img.get_pixel(50, 50), Rgba([255, 0, 0, 255]));
    }

    #[tokio::test]
    async fn render_without_file_is_bad_request() {
        let response = app(state())
            .oneshot(multipart(None, &[("kind", "primary")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_quality_is_bad_request() {
        let png = red_png(8, 8);
        for quality in ["high", "0", "101", "300"] {
            let response = app(state())
                .oneshot(multipart(Some(&png), &[("quality", quality)]))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "quality={quality}");
        }

        let response = app(state())
            .oneshot(multipart(Some(&png), &[("quality", " 70 ")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn undecodable_upload_is_unprocessable() {
        let response = app(state())
            .oneshot(multipart(Some(b"definitely not pixels"), &[]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
    }

    #[test]
    fn upload_type_check_accepts_images_and_octet_stream() {
        assert!(is_image_upload(None));
        assert!(is_image_upload(Some("image/jpeg")));
        assert!(is_image_upload(Some("application/octet-stream")));
        assert!(!is_image_upload(Some("text/plain")));
    }
}
