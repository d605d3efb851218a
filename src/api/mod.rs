// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface.
//!
//! Every JSON endpoint answers with HTTP 200 and the `{errno, errmsg, data}`
//! envelope; the OpenAPI response bodies below describe `data`.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    IntoParams, Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{AuthenticatedUser, Role, SESSION_COOKIE},
    state::AppState,
    storage::{
        records::{
            Content, Holding, Listing, ListingView, MintStatus, OwnershipRecord, SettlementStatus,
            TradeHistoryEntry, TradeRecord,
        },
        repository::content_files::CONTENTS_URL_PREFIX,
    },
};

pub mod accounts;
pub mod auctions;
pub mod content;
pub mod health;
pub mod wallet;

/// Page-number pagination parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// 1-based page number (default 1)
    pub page_num: Option<i64>,
    /// Rows per page (default 10)
    pub page_size: Option<i64>,
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, origin, "Invalid CORS origin, cross-origin requests disabled");
            layer
        }
    }
}

/// Uploaded files are never sniffed, and only raster images render inline.
async fn harden_content_response(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    let renders_inline = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("image/") && !ct.starts_with("image/svg"));
    if !renders_inline {
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment"),
        );
    }
    response
}

pub fn router(state: AppState) -> Router {
    let contents_dir = state.store.paths().contents_dir();
    let cors = cors_layer(&state.config.cors_allowed_origin);

    let contents = Router::new()
        .fallback_service(ServeDir::new(contents_dir))
        .layer(middleware::map_response(harden_content_response));

    let api_routes = Router::new()
        .route("/ping", get(health::ping))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        // Accounts
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route("/session", get(accounts::get_session))
        .route(
            "/users",
            get(accounts::list_users).delete(accounts::delete_user),
        )
        // Content
        .route(
            "/content",
            post(content::upload_content)
                .layer(DefaultBodyLimit::max(content::MAX_UPLOAD_BYTES))
                .get(content::list_contents),
        )
        // Auctions
        .route(
            "/auction",
            post(auctions::create_auction).delete(auctions::cancel_auction),
        )
        .route("/auctions", get(auctions::list_auctions))
        .route("/myauctions", get(auctions::my_auctions))
        .route("/auction/bid", post(auctions::bid_auction))
        .route("/auction/history", get(auctions::auction_history))
        // Chain
        .route("/balance", get(wallet::get_balance))
        .route("/transfer", post(wallet::transfer))
        .route("/token/balance", get(wallet::get_token_balance))
        .route("/token/transfer", post(wallet::token_transfer))
        .route("/token/mint", post(wallet::token_mint))
        .route("/token/owner", get(wallet::token_owner))
        .route("/token/detail", get(wallet::token_detail))
        .route("/pxa721/detail", get(wallet::nft_detail))
        .with_state(state);

    Router::new()
        .merge(api_routes)
        .nest_service(CONTENTS_URL_PREFIX, contents)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

struct SessionCookieAuth;

impl Modify for SessionCookieAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::ping,
        health::liveness,
        health::readiness,
        accounts::register,
        accounts::login,
        accounts::logout,
        accounts::get_session,
        accounts::list_users,
        accounts::delete_user,
        content::upload_content,
        content::list_contents,
        auctions::create_auction,
        auctions::cancel_auction,
        auctions::list_auctions,
        auctions::my_auctions,
        auctions::bid_auction,
        auctions::auction_history,
        wallet::get_balance,
        wallet::transfer,
        wallet::get_token_balance,
        wallet::token_transfer,
        wallet::token_mint,
        wallet::token_owner,
        wallet::token_detail,
        wallet::nft_detail
    ),
    components(
        schemas(
            AuthenticatedUser,
            Role,
            Content,
            MintStatus,
            Holding,
            OwnershipRecord,
            Listing,
            ListingView,
            TradeRecord,
            TradeHistoryEntry,
            SettlementStatus,
            accounts::RegisterRequest,
            accounts::LoginRequest,
            accounts::UserSummary,
            content::UploadResponse,
            content::ContentsResponse,
            auctions::CreateAuctionRequest,
            auctions::CreateAuctionResponse,
            auctions::CancelAuctionResponse,
            auctions::BidRequest,
            wallet::BalanceResponse,
            wallet::TransferRequest,
            wallet::TxResponse,
            wallet::OwnerResponse,
            wallet::EventDumpResponse
        )
    ),
    modifiers(&SessionCookieAuth),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Accounts", description = "Registration, login and sessions"),
        (name = "Content", description = "Content upload and holdings"),
        (name = "Auctions", description = "Fractional ownership listings and bids"),
        (name = "Wallet", description = "Balances, transfers and chain events")
    )
)]
struct ApiDoc;


#[cfg(test)]
mod tests {
    use super::testing::{login_as, register_account, seed_content};
    use super::*;
    use crate::blockchain::testing::FakeChain;
    use crate::state::test_support::{test_state, test_state_with_chain};
    use crate::storage::AccountRepository;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str, cookie: Option<&str>) -> serde_json::Value {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ping_is_plain_text() {
        let (state, _temp) = test_state();
        let response = router(state)
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Pong!");
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (state, _temp) = test_state();
        let response = router(state)
            .oneshot(Request::builder().uri("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn session_endpoints_require_cookie() {
        let (state, _temp) = test_state();
        for uri in ["/session", "/content", "/auctions", "/myauctions", "/auction/history", "/users"] {
            let body = get_json(router(state.clone()), uri, None).await;
            assert_eq!(body["errno"], "4002", "{uri}");
            assert!(body["data"].is_null());
        }
    }

    fn ledger_snapshot(state: &AppState, address: &str, token_id: u64) -> serde_json::Value {
        serde_json::json!({
            "accounts": state.ledger.list_accounts(1, 100).unwrap(),
            "holdings": state.ledger.holdings(address).unwrap(),
            "listing": state.ledger.get_listing(address, token_id).unwrap(),
            "open": state.ledger.open_listings("0x0000000000000000000000000000000000000000").unwrap(),
        })
    }

    #[tokio::test]
    async fn state_changing_routes_reject_missing_session() {
        let (state, chain, temp) = test_state_with_chain(FakeChain::new());
        let alice = register_account(&state, "alice").await;
        register_account(&state, "admin").await;
        let token_id = seed_content(&state, &alice);
        state.ledger.create_listing(&alice, token_id, 40, 5).unwrap();

        let before = ledger_snapshot(&state, &alice, token_id);
        let transfer = r#"{"to":"0xb2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2","value":"10"}"#.to_string();
        let cases = [
            ("POST", "/auction".to_string(), format!(r#"{{"token_id":"{token_id}","weight":10,"price":5}}"#)),
            ("DELETE", format!("/auction?token_id={token_id}"), String::new()),
            (
                "POST",
                "/auction/bid".to_string(),
                format!(r#"{{"address":"{alice}","token_id":"{token_id}","weight":10,"price":5}}"#),
            ),
            ("POST", "/transfer".to_string(), transfer.clone()),
            ("POST", "/token/transfer".to_string(), transfer.clone()),
            ("POST", "/token/mint".to_string(), transfer),
            ("DELETE", format!("/users?address={alice}"), String::new()),
            ("POST", "/logout".to_string(), String::new()),
        ];

        for (method, uri, body) in cases {
            let request = Request::builder()
                .method(method)
                .uri(&uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap();
            let response = router(state.clone()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{method} {uri}");
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["errno"], "4002", "{method} {uri}");
            assert!(body["data"].is_null(), "{method} {uri}");
        }

        assert!(chain.calls().is_empty());
        assert_eq!(ledger_snapshot(&state, &alice, token_id), before);
        assert!(AccountRepository::new(&state.store).exists(&alice));
        assert!(!temp.path().join("contents").read_dir().unwrap().any(|_| true));
    }

    #[tokio::test]
    async fn session_roundtrip_through_router() {
        let (state, _temp) = test_state();
        let address = register_account(&state, "alice").await;
        let cookie = login_as(&state, "alice");

        let body = get_json(router(state), "/session", Some(&cookie)).await;
        assert_eq!(body["errno"], "0");
        assert_eq!(body["data"]["address"], address);
        assert_eq!(body["data"]["role"], "client");
    }

    #[tokio::test]
    async fn malformed_json_is_param_error() {
        let (state, _temp) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["errno"], "4003");
    }

    #[tokio::test]
    async fn openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/auction/bid", "/content", "/token/mint", "/pxa721/detail"] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
