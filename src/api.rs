//! # Read view
//! Read-only HTTP surface over the stored snapshot. It never talks to the
//! orchestrator; every request reads the store file as it is on disk.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::error::StoreError;
use crate::item::Item;
use crate::store::SnapshotStore;

/// Where a reader can see who is sharing an article.
const SHARE_SEARCH_URL: &str = "https://twitter.com/search?f=realtime&q=";

#[derive(Clone)]
pub struct ViewState {
    pub store: SnapshotStore,
    pub verb: String,
}

pub fn router(state: ViewState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/items", get(items_json))
        .route("/health", get(|| async { "OK" }))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn load_for_view(store: &SnapshotStore) -> Result<Vec<Item>, Response> {
    match store.load().await {
        Ok(items) => Ok(items),
        Err(StoreError::NotFound(_)) => Ok(Vec::new()),
        Err(e) => {
            tracing::warn!(target: "api", "snapshot read failed: {e}");
            Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response())
        }
    }
}

async fn index(State(state): State<ViewState>) -> Response {
    match load_for_view(&state.store).await {
        Ok(items) => Html(render_page(&items, &state.verb)).into_response(),
        Err(resp) => resp,
    }
}

async fn items_json(State(state): State<ViewState>) -> Response {
    match load_for_view(&state.store).await {
        Ok(items) => Json(items).into_response(),
        Err(resp) => resp,
    }
}

/// Row background by share count; hotter articles get a stronger red.
fn heat_color(metric: u64) -> Option<&'static str> {
    match metric {
        0..=99 => None,
        100..=199 => Some("#fcc"),
        200..=299 => Some("#f99"),
        300..=399 => Some("#f77"),
        _ => Some("#f55"),
    }
}

fn render_row(it: &Item, verb: &str) -> String {
    let date = it.published.format("%Y-%m-%d");
    let href = html_escape::encode_double_quoted_attribute(&it.url);
    let search = html_escape::encode_double_quoted_attribute(&format!("{SHARE_SEARCH_URL}{}", it.url))
        .into_owned();
    let title = html_escape::encode_text(&it.title);
    let li = format!(
        "<li>{date}: <a href=\"{href}\" target=\"_blank\">{title}</a> (<a href=\"{search}\" target=\"_blank\">{}</a>{verb})</li>\n",
        it.metric
    );
    match heat_color(it.metric) {
        Some(c) => format!("<div style=\"background-color: {c}\">{li}</div>"),
        None => li,
    }
}

pub fn render_page(items: &[Item], verb: &str) -> String {
    let verb = html_escape::encode_text(verb);
    let mut out = String::from("<html><body>\n<ul>\n");
    for it in items {
        out.push_str(&render_row(it, &verb));
    }
    out.push_str("</ul>\n</body></html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn item(title: &str, metric: u64) -> Item {
        let published = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 9, 6, 0, 0, 0)
            .unwrap();
        Item::new(published, "https://x/a?b=1&c=2", title, metric)
    }

    #[test]
    fn heat_tiers() {
        assert_eq!(heat_color(99), None);
        assert_eq!(heat_color(100), Some("#fcc"));
        assert_eq!(heat_color(250), Some("#f99"));
        assert_eq!(heat_color(399), Some("#f77"));
        assert_eq!(heat_color(4000), Some("#f55"));
    }

    #[test]
    fn rows_are_escaped_and_dated_in_source_zone() {
        let html = render_page(&[item("<b>Hi</b>", 120)], "RT");
        assert!(html.contains("2025-09-06: "));
        assert!(html.contains("&lt;b&gt;Hi&lt;/b&gt;"));
        assert!(html.contains("href=\"https://x/a?b=1&amp;c=2\""));
        assert!(html.contains(">120</a>RT)"));
        assert!(html.contains("background-color: #fcc"));
    }
}
