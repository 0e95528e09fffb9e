/*
 * Responsibility
 * - v1 の URL 構造と、各 endpoint の認可要件 (Requirement) を定義
 * - /test 配下は ENABLE_TEST_ROUTE のときだけ載せる
 */
use axum::{
    Router,
    routing::{get, get_service, post_service},
};

use crate::api::v1::handlers::{
    health::health,
    hello::{get_hello, home, save_hello},
    test::{admin, html, issue_token, redirect, whoami},
};
use crate::handler::Requirement;
use crate::state::AppState;

pub fn routes(state: &AppState, enable_test_route: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/", get_service(state.handle(Requirement::Open, home)))
        .route(
            "/hello",
            post_service(state.handle(Requirement::RequiresClaim, save_hello)),
        )
        .route(
            "/hello/{id}",
            get_service(state.handle(Requirement::Open, get_hello)),
        );

    if enable_test_route {
        router.nest("/test", test_routes(state))
    } else {
        router
    }
}

fn test_routes(state: &AppState) -> Router {
    Router::new()
        .route(
            "/token",
            post_service(state.handle(Requirement::Open, issue_token)),
        )
        .route(
            "/whoami",
            get_service(state.handle(Requirement::RequiresClaim, whoami)),
        )
        .route(
            "/admin",
            get_service(state.handle(Requirement::RequiresElevated, admin)),
        )
        .route("/html", get_service(state.handle(Requirement::Open, html)))
        .route(
            "/redirect",
            get_service(state.handle(Requirement::Open, redirect)),
        )
}
