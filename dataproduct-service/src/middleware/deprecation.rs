//! Deprecation headers for configured API versions

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;
use crate::versioning::extract_version_from_path;

/// Attach `Deprecation`/`Sunset`/`Link` headers when the path's version is deprecated
///
/// Install with `axum::middleware::from_fn_with_state`.
pub async fn deprecation_headers(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let version = extract_version_from_path(request.uri().path());
    let mut response = next.run(request).await;

    if let Some(info) = version.and_then(|v| state.config().deprecation_for(v)) {
        tracing::debug!(version = %info.version, "serving deprecated API version");
        info.apply_headers(response.headers_mut());
    }
    response
}
