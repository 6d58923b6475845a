//! Request-id propagation.
//!
//! [`SetRequestIdLayer`] stamps every inbound request with an
//! `x-request-id` (keeping a caller-supplied one) and
//! [`PropagateRequestIdLayer`] mirrors it onto the response. The middleware
//! here scopes the id into a task-local so response rendering — error
//! bodies in particular — can pick it up without threading it through
//! every handler.

use std::cell::RefCell;

use axum::{extract::Request, middleware::Next, response::Response};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static CURRENT_REQUEST_ID: RefCell<Option<String>>;
}

/// Layer assigning a fresh uuid to requests that arrive without an id.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer mirroring the request id onto the response headers.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// The current request's id, when called inside [`scope_request_id`].
pub fn current_request_id() -> Option<String> {
    CURRENT_REQUEST_ID
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
}

/// Make the id assigned by [`set_request_id_layer`] visible through
/// [`current_request_id`] for the rest of the request.
pub async fn scope_request_id(request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<tower_http::request_id::RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .map(str::to_string);

    CURRENT_REQUEST_ID
        .scope(RefCell::new(request_id), next.run(request))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/",
                get(|| async { current_request_id().unwrap_or_default() }),
            )
            .layer(axum::middleware::from_fn(scope_request_id))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    #[tokio::test]
    async fn assigns_and_propagates_an_id() {
        let response = app()
            .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .expect("response carries a request id");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), header);
    }

    #[tokio::test]
    async fn keeps_a_caller_supplied_id() {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/")
                    .header(REQUEST_ID_HEADER, "caller-id-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "caller-id-42"
        );
    }

    #[tokio::test]
    async fn no_id_outside_a_request_scope() {
        assert!(current_request_id().is_none());
    }
}
