//! Scrape endpoint: `GET /metrics` in Prometheus text format.
//!
//! Never touches a sensor; it shows whatever the poll loop last published.

use crate::infrastructure::observability::Metrics;
use crate::infrastructure::observability::metrics::CONTENT_TYPE;
use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;

pub fn router(metrics: Metrics) -> Router {
    Router::new()
        .route("/metrics", get(scrape))
        .with_state(metrics)
}

async fn scrape(State(metrics): State<Metrics>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], metrics.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_scrape_exposes_gauges() {
        let metrics = Metrics::new().unwrap();
        metrics.set_temperature(72.5);
        metrics.set_humidity(45.0);
        metrics.increment_poll_count();

        let response = router(metrics)
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("cems_temperature 72.5"));
        assert!(text.contains("cems_humidity 45"));
        assert!(text.contains("cems_poll_operations_total 1"));
    }
}
