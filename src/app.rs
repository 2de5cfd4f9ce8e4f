use axum::{http::HeaderValue, Router};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::auth::IdentityProvider;
use crate::config::Settings;
use crate::lifecycle::ProcurementManager;
use crate::middleware::{request_id_layer, X_REQUEST_ID};
use crate::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub procurement: ProcurementManager,
    /// Verifies bearer credentials on protected routes
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        procurement: ProcurementManager,
        identity: Arc<dyn IdentityProvider>,
    ) -> Arc<Self> {
        Arc::new(Self {
            settings,
            procurement,
            identity,
        })
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(&state.settings);

    // Build trace layer (use DEBUG for spans to reduce overhead at INFO level)
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    // Request ID layers
    let (set_request_id, propagate_request_id) = request_id_layer();

    let body_limit = RequestBodyLimitLayer::new(state.settings.request_body_limit_bytes);

    // Build router (routes at root level, no /api prefix)
    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(body_limit)
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // In dev mode, use longer preflight cache to reduce OPTIONS requests
    let max_age = if settings.env.is_dev() {
        std::time::Duration::from_secs(86400)
    } else {
        std::time::Duration::from_secs(3600)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static(X_REQUEST_ID),
            axum::http::HeaderName::from_static(crate::auth::middleware::X_AUTH_TOKEN),
        ]))
        .allow_credentials(true)
        .max_age(max_age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::{identity::sign_test_token, JwtIdentityProvider};
    use crate::domain::{Role, UserProfile};
    use crate::services::UrlDocumentStore;
    use crate::store::MemoryStore;

    const SECRET: &str = "router-secret";

    fn test_app() -> Router {
        let settings = Settings::for_tests(SECRET);
        let documents = UrlDocumentStore::new(&settings.document_base_url).unwrap();
        let procurement =
            ProcurementManager::new(Arc::new(MemoryStore::new()), Arc::new(documents));
        let identity = Arc::new(JwtIdentityProvider::new(SECRET));
        create_app(AppState::new(settings, procurement, identity))
    }

    fn user(role: Role, company: Option<&str>) -> (UserProfile, String) {
        let mut profile = UserProfile::bare(Uuid::new_v4(), role);
        profile.company = company.map(str::to_string);
        let token = sign_test_token(SECRET, &profile);
        (profile, token)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn tender_body() -> Value {
        json!({
            "title": "Office fit-out",
            "description": "Two floors, open plan",
            "category": "construction",
            "end_date": "2099-01-01T00:00:00Z",
            "min_budget": "1000",
            "max_budget": "5000",
            "documents": [{ "file_name": "scope.pdf" }]
        })
    }

    #[tokio::test]
    async fn health_reports_memory_store() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"]["backend"], "memory");
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthorized() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/me", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["message"], "No token, authorization denied");
    }

    #[tokio::test]
    async fn rejected_token_shares_error_body_and_carries_request_id() {
        let app = test_app();
        let (profile, _) = user(Role::Admin, None);
        let forged = sign_test_token("not-the-server-secret", &profile);

        let request = Request::builder()
            .uri("/me")
            .header(header::AUTHORIZATION, format!("Bearer {forged}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({ "code": "UNAUTHORIZED", "message": "Token is not valid" })
        );
    }

    #[tokio::test]
    async fn legacy_token_header_is_accepted() {
        let app = test_app();
        let (profile, token) = user(Role::Bidder, None);

        let request = Request::builder()
            .uri("/me")
            .header("x-auth-token", token)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["id"], profile.id.to_string());
    }

    #[tokio::test]
    async fn tender_award_flow_over_http() {
        let app = test_app();
        let (_, admin) = user(Role::Admin, None);
        let (_, x) = user(Role::Bidder, Some("X Ltd"));
        let (_, y) = user(Role::Bidder, Some("Y Ltd"));

        let (status, created) =
            send(&app, Method::POST, "/tenders", Some(&admin), Some(tender_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["status"], "open");
        assert_eq!(
            created["data"]["documents"][0]["file_url"],
            "http://files.test/uploads/scope.pdf"
        );
        let tender_id = created["data"]["id"].as_str().unwrap().to_string();

        let bids_uri = format!("/tenders/{tender_id}/bids");
        let (status, bid_x) = send(
            &app,
            Method::POST,
            &bids_uri,
            Some(&x),
            Some(json!({ "bid_amount": "100" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, bid_y) = send(
            &app,
            Method::POST,
            &bids_uri,
            Some(&y),
            Some(json!({ "bid_amount": "90" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, listed) = send(&app, Method::GET, &bids_uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["data"][0]["id"], bid_y["data"]["id"]);
        assert_eq!(listed["data"][0]["bidder"]["company"], "Y Ltd");

        let bid_x_id = bid_x["data"]["id"].as_str().unwrap().to_string();
        let (status, award) = send(
            &app,
            Method::PUT,
            &format!("/bids/{bid_x_id}/accept"),
            Some(&admin),
            Some(json!({ "tender_id": tender_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(award["code"], "BID_ACCEPTED");
        assert_eq!(award["data"]["rejected_bids"], 1);

        let (status, tender) =
            send(&app, Method::GET, &format!("/tenders/{tender_id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tender["data"]["status"], "awarded");

        let (status, done) = send(
            &app,
            Method::PUT,
            &format!("/bids/{bid_x_id}/complete"),
            Some(&x),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["data"]["tender_completed"], true);

        let (status, mine) =
            send(&app, Method::GET, "/bids/mine?status=rejected", Some(&y), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine["data"].as_array().unwrap().len(), 1);
        assert_eq!(mine["data"][0]["tender"]["status"], "completed");
    }

    #[tokio::test]
    async fn lifecycle_errors_map_to_status_codes() {
        let app = test_app();
        let (_, admin) = user(Role::Admin, None);
        let (_, bidder) = user(Role::Bidder, None);

        let (status, body) =
            send(&app, Method::POST, "/tenders", Some(&bidder), Some(tender_body())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (_, created) =
            send(&app, Method::POST, "/tenders", Some(&admin), Some(tender_body())).await;
        let bids_uri = format!("/tenders/{}/bids", created["data"]["id"].as_str().unwrap());
        let bid = json!({ "bid_amount": "10" });

        send(&app, Method::POST, &bids_uri, Some(&bidder), Some(bid.clone())).await;
        let (status, body) = send(&app, Method::POST, &bids_uri, Some(&bidder), Some(bid)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, body) = send(
            &app,
            Method::POST,
            &bids_uri,
            Some(&bidder),
            Some(json!({ "bid_amount": "-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (_, newcomer) = user(Role::Bidder, None);
        for amount in ["1000000000000", "0.005"] {
            let (status, body) = send(
                &app,
                Method::POST,
                &bids_uri,
                Some(&newcomer),
                Some(json!({ "bid_amount": amount })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "amount {amount}");
            assert_eq!(body["code"], "VALIDATION_ERROR");
        }

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/tenders/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = test_app();
        let (_, admin) = user(Role::Admin, None);

        let (status, body) = send(
            &app,
            Method::POST,
            "/tenders",
            Some(&admin),
            Some(json!({ "title": "missing fields" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
