use axum::Json;
use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::ErrorBody;

/// Body limit for JSON requests (1 MiB)
const BODY_LIMIT_BYTES: usize = 1 << 20;

/// JSON body extractor whose rejections use the flat error body
///
/// axum's own `Json` rejects with plain text; callers of this gateway
/// expect `{"error": "..."}` for every failure.
pub struct JsonPayload<T>(pub T);

impl<S, T: DeserializeOwned> axum::extract::FromRequest<S> for JsonPayload<T>
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        let is_json = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if !is_json {
            return Err(reject(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "expected 'Content-Type: application/json'".to_owned(),
            ));
        }

        let bytes = axum::body::to_bytes(body, BODY_LIMIT_BYTES).await.map_err(|err| {
            if std::error::Error::source(&err).is_some_and(|source| source.is::<http_body_util::LengthLimitError>()) {
                reject(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("request body is too large, limit is {BODY_LIMIT_BYTES} bytes"),
                )
            } else {
                reject(StatusCode::BAD_REQUEST, format!("failed to read request body: {err}"))
            }
        })?;

        serde_json::from_slice::<T>(&bytes)
            .map(Self)
            .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("failed to parse request body: {e}")))
    }
}

fn reject(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}
