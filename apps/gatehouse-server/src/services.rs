use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use gatehouse_pipeline::{Identity, SecuredState, security_middleware};
use gatehouse_security::PluginRegistry;
use time::format_description::well_known::Rfc3339;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    registry: Arc<PluginRegistry>,
}

/// Build the full application router: the built-in services behind the
/// security middleware, plus request tracing.
pub fn router(registry: Arc<PluginRegistry>) -> Router {
    let secured = SecuredState::from_registry(registry.clone());

    Router::new()
        .route("/ping", get(ping))
        .route("/tokens", get(get_token).delete(delete_token))
        .route("/roles/{id}", get(roles))
        .layer(from_fn_with_state(secured, security_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                request_id = %uuid::Uuid::new_v4(),
                method = %request.method(),
                path = request.uri().path(),
            )
        }))
        .with_state(AppState { registry })
}

async fn ping() -> &'static str {
    "pong"
}

/// Current token of the authenticated caller.
#[allow(clippy::needless_pass_by_value)] // axum extractors are taken by value
async fn get_token(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> Response {
    let Some(Extension(identity)) = identity else {
        return StatusCode::FORBIDDEN.into_response();
    };
    let Some(manager) = state.registry.token_manager() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(token) = manager.get(&identity.account).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let valid_until = token
        .valid_until()
        .format(&Rfc3339)
        .unwrap_or_else(|_| token.valid_until().to_string());
    Json(serde_json::json!({
        "auth_token": token.value(),
        "auth_token_valid_until": valid_until,
    }))
    .into_response()
}

/// Invalidate the caller's token. Idempotent.
#[allow(clippy::needless_pass_by_value)] // axum extractors are taken by value
async fn delete_token(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> Response {
    let Some(Extension(identity)) = identity else {
        return StatusCode::FORBIDDEN.into_response();
    };
    let Some(manager) = state.registry.token_manager() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    manager.invalidate(&identity.account).await;
    StatusCode::NO_CONTENT.into_response()
}

/// Roles of the authenticated caller. Asking about anyone else is 403,
/// regardless of the caller's own privileges.
#[allow(clippy::needless_pass_by_value)] // axum extractors are taken by value
async fn roles(Path(id): Path<String>, identity: Option<Extension<Identity>>) -> Response {
    let Some(Extension(identity)) = identity else {
        return StatusCode::FORBIDDEN.into_response();
    };
    if identity.account.principal() != id {
        return StatusCode::FORBIDDEN.into_response();
    }

    Json(serde_json::json!({
        "authenticated": true,
        "roles": identity.account.roles(),
    }))
    .into_response()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::bootstrap;
    use crate::config::SecurityConfig;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use gatehouse_security::AUTH_TOKEN_HEADER;
    use http::header::AUTHORIZATION;
    use std::net::SocketAddr;
    use tower::ServiceExt;

    fn security_config() -> SecurityConfig {
        serde_json::from_value(serde_json::json!({
            "basic": { "enabled": true, "realm": "test" },
            "token_basic": { "enabled": true },
            "tokens": { "enabled": true },
            "static_realm": {
                "users": [
                    { "id": "alice", "password": "secret", "roles": ["admin"] }
                ]
            },
            "authorizers": {
                "predicates": {
                    "enabled": true,
                    "rules": [
                        { "role": "$unauthenticated", "methods": ["GET"], "path": "/ping" },
                        { "role": "admin", "path": "/{*rest}" }
                    ]
                },
                "ip_blocklist": {
                    "enabled": true,
                    "blocked": ["10.0.0.66"]
                }
            },
            "log_failed_auth": true
        }))
        .unwrap()
    }

    fn app() -> Router {
        router(bootstrap::build_registry(&security_config()).unwrap())
    }

    fn basic(id: &str, secret: &str) -> String {
        format!("Basic {}", BASE64.encode(format!("{id}:{secret}")))
    }

    fn request(method: &str, path: &str, auth: Option<&str>) -> Request {
        let mut builder = http::Request::builder().method(method).uri(path);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        request
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ping_is_open_to_anonymous_callers() {
        let response = app()
            .oneshot(request("GET", "/ping", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn token_service_round_trip() {
        let app = app();

        // Password auth; the response already carries a token header.
        let response = app
            .clone()
            .oneshot(request("GET", "/tokens", Some(&basic("alice", "secret"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let header_token = response
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_owned();
        let body = body_json(response).await;
        assert_eq!(body["auth_token"], header_token);

        // The token itself authenticates through the token mechanism.
        let response = app
            .clone()
            .oneshot(request("GET", "/tokens", Some(&basic("alice", &header_token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Invalidation kills it.
        let response = app
            .clone()
            .oneshot(request(
                "DELETE",
                "/tokens",
                Some(&basic("alice", "secret")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn roles_service_only_answers_about_the_caller() {
        let app = app();

        let own = app
            .clone()
            .oneshot(request(
                "GET",
                "/roles/alice",
                Some(&basic("alice", "secret")),
            ))
            .await
            .unwrap();
        assert_eq!(own.status(), StatusCode::OK);
        let body = body_json(own).await;
        assert_eq!(body["roles"], serde_json::json!(["admin"]));

        let other = app
            .clone()
            .oneshot(request(
                "GET",
                "/roles/bob",
                Some(&basic("alice", "secret")),
            ))
            .await
            .unwrap();
        assert_eq!(other.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected() {
        let response = app()
            .oneshot(request("GET", "/tokens", Some(&basic("alice", "wrong"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn blocklisted_address_is_vetoed_despite_valid_credentials() {
        let mut request = request("GET", "/ping", Some(&basic("alice", "secret")));
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 66], 40000))));

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

