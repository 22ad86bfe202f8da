//! HTTP handler mapping request bodies onto the resolver.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use embed_proxy_embeddings::{
    EmbeddingError, EmbeddingRequest, EmbeddingResolver, EmbeddingResponse, ErrorKind,
};
use tracing::{debug, error};

/// Handle one embedding request.
///
/// The body is decoded by hand rather than through the `Json` extractor so
/// that a missing or wrong `Content-Type` is accepted, and every decode
/// failure gets the same plain-text 400.
pub async fn embed(State(resolver): State<EmbeddingResolver>, body: Bytes) -> Response {
    let request: EmbeddingRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!("Rejecting undecodable body: {e}");
            return (StatusCode::BAD_REQUEST, "Invalid request body").into_response();
        }
    };

    match resolver.resolve(request).await {
        Ok(resolution) => Json(EmbeddingResponse::from(resolution)).into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(err: &EmbeddingError) -> Response {
    match err.kind() {
        ErrorKind::Client => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        ErrorKind::Server => {
            error!("Failed to get embeddings: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to get embeddings: {err}"),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let client = error_response(&EmbeddingError::InvalidRequest("model must not be empty".into()));
        assert_eq!(client.status(), StatusCode::BAD_REQUEST);

        let server = error_response(&EmbeddingError::ApiRequest("boom".into()));
        assert_eq!(server.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let corrupt = error_response(&EmbeddingError::CorruptBlob { len: 6 });
        assert_eq!(corrupt.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
