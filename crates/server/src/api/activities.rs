//! Activity endpoints.
//!
//! The activity list supports conditional requests: it carries a
//! `Last-Modified` header with the latest activity update and answers
//! `304 Not Modified` to a matching `If-Modified-Since`.

use axum::extract::{Extension, Json, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use restvoice_core::Activity;

use super::schemas::ErrorResponse;
use super::{AppState, created};
use crate::auth::Claims;
use crate::error::ServerError;

/// IMF-fixdate as used by `Last-Modified` and `If-Modified-Since`.
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

const CACHE_CONTROL: &str = "public, max-age=0";

/// `GET /activities` -- activities of the caller.
#[utoipa::path(
    get,
    path = "/activities",
    tag = "Activities",
    summary = "List activities",
    description = "Returns the caller's activities. Honours If-Modified-Since unless the request carries Cache-Control: no-cache.",
    params(
        ("If-Modified-Since" = Option<String>, Header, description = "HTTP date of the cached copy"),
    ),
    responses(
        (status = 200, description = "Activities of the caller", body = [Activity]),
        (status = 304, description = "Activities unchanged since the given date"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn list_activities(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> Response {
    let activities = state.usecases.activities.run(&claims.subject).await;
    let last_modified = activities.iter().map(|a| a.updated).max();

    if let Some(last) = last_modified
        && !wants_fresh_copy(&headers)
        && let Some(since) = headers.get(header::IF_MODIFIED_SINCE)
    {
        // An unparseable date makes the request unconditional.
        match parse_http_date(since) {
            // HTTP dates have second precision.
            Some(since) if last.timestamp() <= since.timestamp() => {
                return with_cache_headers(StatusCode::NOT_MODIFIED.into_response(), last);
            }
            Some(_) => {}
            None => debug!(value = ?since, "ignoring malformed If-Modified-Since"),
        }
    }

    let response = Json(activities).into_response();
    match last_modified {
        Some(last) => with_cache_headers(response, last),
        None => response,
    }
}

/// `POST /activities` -- create an activity owned by the caller.
#[utoipa::path(
    post,
    path = "/activities",
    tag = "Activities",
    summary = "Create an activity",
    request_body(content = Activity, description = "Activity to create; id and userId are assigned"),
    responses(
        (status = 201, description = "Activity created", body = Activity),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn create_activity(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    uri: Uri,
    Json(activity): Json<Activity>,
) -> Result<Response, ServerError> {
    let created_activity = state
        .usecases
        .create_activity
        .run(&claims.subject, activity)
        .await?;
    Ok(created(&uri, created_activity.id, created_activity))
}

fn wants_fresh_copy(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::CACHE_CONTROL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
}

fn parse_http_date(value: &HeaderValue) -> Option<DateTime<Utc>> {
    let value = value.to_str().ok()?;
    NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE)
        .ok()
        .map(|naive| naive.and_utc())
}

fn format_http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE).to_string()
}

fn with_cache_headers(mut response: Response, last: DateTime<Utc>) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
    if let Ok(value) = HeaderValue::from_str(&format_http_date(last)) {
        headers.insert(header::LAST_MODIFIED, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn http_date_round_trips_at_second_precision() {
        let at = Utc.with_ymd_and_hms(2018, 6, 1, 9, 30, 15).unwrap();
        let text = format_http_date(at);
        assert_eq!(text, "Fri, 01 Jun 2018 09:30:15 GMT");
        let parsed = parse_http_date(&HeaderValue::from_str(&text).unwrap()).unwrap();
        assert_eq!(parsed, at);
    }

    #[test]
    fn rejects_non_http_dates() {
        assert!(parse_http_date(&HeaderValue::from_static("2018-06-01")).is_none());
    }

    #[test]
    fn no_cache_directive_is_detected() {
        let mut headers = HeaderMap::new();
        assert!(!wants_fresh_copy(&headers));
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("max-age=0, No-Cache"),
        );
        assert!(wants_fresh_copy(&headers));
    }
}
