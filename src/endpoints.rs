//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/invoices/{invoice_id}',
//! use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for signed-in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/login";
/// The route for getting the sign up page.
pub const SIGN_UP_VIEW: &str = "/signup";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for registering a new user and starting their session.
pub const SIGN_UP_API: &str = "/api/auth/signup";
/// The route for inspecting the current session.
pub const SESSION_API: &str = "/api/auth/session";
/// The route for the client to end the current session.
pub const LOG_OUT_API: &str = "/api/auth/logout";
/// The route for checking an access phrase before signup.
pub const VERIFY_API: &str = "/api/verify";
/// The route to access invoices.
pub const INVOICES_API: &str = "/api/invoices";
/// The route to access a single invoice.
pub const INVOICE: &str = "/api/invoices/{invoice_id}";
/// The route for invoice aggregates (monthly, total, balance).
pub const INVOICE_STATS_API: &str = "/api/invoices/stats";
/// The route to access expenditures.
pub const EXPENDITURES_API: &str = "/api/expenditures";
/// The route to access congregation members.
pub const MEMBERS_API: &str = "/api/members";
/// The route to access invoice and expense tags.
pub const TAGS_API: &str = "/api/tags";
/// The route listing invoice tags for form drop-downs.
pub const INVOICE_TAGS_API: &str = "/api/invoice-tags";
/// The route expanding invoices over their effective month ranges.
pub const INVOICE_ATTRIBUTIONS_API: &str = "/api/invoice-attributions";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/invoices/{invoice_id}',
/// '{invoice_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_VIEW);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN_VIEW);
        assert_endpoint_is_valid_uri(endpoints::SIGN_UP_VIEW);
        assert_endpoint_is_valid_uri(endpoints::STATIC);

        assert_endpoint_is_valid_uri(endpoints::SIGN_UP_API);
        assert_endpoint_is_valid_uri(endpoints::SESSION_API);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT_API);
        assert_endpoint_is_valid_uri(endpoints::VERIFY_API);
        assert_endpoint_is_valid_uri(endpoints::INVOICES_API);
        assert_endpoint_is_valid_uri(endpoints::INVOICE);
        assert_endpoint_is_valid_uri(endpoints::INVOICE_STATS_API);
        assert_endpoint_is_valid_uri(endpoints::EXPENDITURES_API);
        assert_endpoint_is_valid_uri(endpoints::MEMBERS_API);
        assert_endpoint_is_valid_uri(endpoints::TAGS_API);
        assert_endpoint_is_valid_uri(endpoints::INVOICE_TAGS_API);
        assert_endpoint_is_valid_uri(endpoints::INVOICE_ATTRIBUTIONS_API);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
