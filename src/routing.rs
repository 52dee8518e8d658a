//! Application router configuration with the API tree, public pages and the
//! gatekept ledger pages.

use axum::{
    Router,
    extract::FromRef,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState, Error,
    access_key::verify_endpoint,
    attribution::get_attributions_endpoint,
    auth::{AuthState, auth_guard},
    endpoints,
    expenditure::{
        create_expenditure_endpoint, delete_expenditure_endpoint, get_expenditures_endpoint,
        update_expenditure_endpoint,
    },
    invoice::{create_invoice_endpoint, delete_invoice_endpoint, get_invoices_endpoint},
    logging::logging_middleware,
    member::{create_member_endpoint, delete_member_endpoint, get_members_endpoint},
    session::{get_session_endpoint, log_out_endpoint},
    signup::sign_up_endpoint,
    stats::get_invoice_stats_endpoint,
    tag::{
        create_tag_endpoint, get_invoice_tag_options_endpoint, get_tags_endpoint,
        rename_tag_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(endpoints::SIGN_UP_API, post(sign_up_endpoint))
        .route(endpoints::SESSION_API, get(get_session_endpoint))
        .route(endpoints::LOG_OUT_API, post(log_out_endpoint))
        .route(endpoints::VERIFY_API, post(verify_endpoint))
        .route(endpoints::INVOICE_STATS_API, get(get_invoice_stats_endpoint))
        .route(
            endpoints::INVOICES_API,
            get(get_invoices_endpoint).post(create_invoice_endpoint),
        )
        .route(endpoints::INVOICE, delete(delete_invoice_endpoint))
        .route(
            endpoints::EXPENDITURES_API,
            get(get_expenditures_endpoint)
                .post(create_expenditure_endpoint)
                .put(update_expenditure_endpoint)
                .delete(delete_expenditure_endpoint),
        )
        .route(
            endpoints::MEMBERS_API,
            get(get_members_endpoint)
                .post(create_member_endpoint)
                .delete(delete_member_endpoint),
        )
        .route(
            endpoints::TAGS_API,
            get(get_tags_endpoint)
                .post(create_tag_endpoint)
                .put(rename_tag_endpoint),
        )
        .route(endpoints::INVOICE_TAGS_API, get(get_invoice_tag_options_endpoint))
        .route(
            endpoints::INVOICE_ATTRIBUTIONS_API,
            get(get_attributions_endpoint),
        );

    let unprotected_pages = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::SIGN_UP_VIEW, get(get_sign_up_page));

    let protected_pages = Router::new()
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .layer(middleware::from_fn_with_state(
            AuthState::from_ref(&state),
            auth_guard,
        ));

    api_routes
        .merge(unprotected_pages)
        .merge(protected_pages)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

/// Page shells load the UI bundle from `/static`; their markup is owned by
/// the front-end build and is not part of the API contract.
async fn get_log_in_page() -> Html<&'static str> {
    Html(r#"<!DOCTYPE html><html><body><div id="root" data-page="login"></div><script src="/static/app.js"></script></body></html>"#)
}

async fn get_sign_up_page() -> Html<&'static str> {
    Html(r#"<!DOCTYPE html><html><body><div id="root" data-page="signup"></div><script src="/static/app.js"></script></body></html>"#)
}

async fn get_dashboard_page() -> Html<&'static str> {
    Html(r#"<!DOCTYPE html><html><body><div id="root" data-page="dashboard"></div><script src="/static/app.js"></script></body></html>"#)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;

    use crate::{
        build_router, endpoints,
        test_utils::{session_cookie, test_app_state},
    };

    fn get_test_server() -> (TestServer, crate::AppState) {
        let state = test_app_state();
        let server = TestServer::try_new(build_router(state.clone()))
            .expect("Could not create test server.");

        (server, state)
    }

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let (server, _state) = get_test_server();

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn dashboard_without_cookie_redirects_to_log_in() {
        let (server, _state) = get_test_server();

        let response = server.get(endpoints::DASHBOARD_VIEW).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn dashboard_with_cookie_is_served() {
        let (server, state) = get_test_server();

        server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(session_cookie(&state))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn log_in_and_sign_up_pages_are_public() {
        let (server, _state) = get_test_server();

        server.get(endpoints::LOG_IN_VIEW).await.assert_status_ok();
        server.get(endpoints::SIGN_UP_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_path_is_a_json_404() {
        let (server, _state) = get_test_server();

        let response = server.get("/no-such-page").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"], "The requested resource could not be found.");
    }
}
