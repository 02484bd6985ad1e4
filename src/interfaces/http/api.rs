//! Status endpoint: `GET /` reads the environment sensor on every request.

use crate::domain::ports::EnvironmentSensor;
use crate::domain::reading::EnvironmentReading;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

#[derive(Clone)]
pub struct ApiState {
    pub environment: Arc<dyn EnvironmentSensor>,
    pub read_timeout: Duration,
}

/// Headroom kept between the sensor read deadline and the response deadline,
/// so a slow read always resolves to zeros before the request times out.
const RESPONSE_MARGIN: Duration = Duration::from_millis(10);

pub fn router(mut state: ApiState, write_timeout: Duration) -> Router {
    state.read_timeout = state
        .read_timeout
        .min(write_timeout.saturating_sub(RESPONSE_MARGIN));

    Router::new()
        .route("/", get(status))
        .layer(middleware::from_fn_with_state(write_timeout, enforce_deadline))
        .with_state(state)
}

/// A failed or slow read still answers 200, with zeroed fields.
async fn status(State(state): State<ApiState>) -> Response {
    let reading = match tokio::time::timeout(
        state.read_timeout,
        state.environment.read_environment(),
    )
    .await
    {
        Ok(Ok(reading)) => reading,
        Ok(Err(e)) => {
            warn!("Status: Environment read failed: {}", e);
            EnvironmentReading::default()
        }
        Err(_) => {
            warn!(
                "Status: Environment read exceeded {:?}",
                state.read_timeout
            );
            EnvironmentReading::default()
        }
    };

    json_response(&reading)
}

async fn enforce_deadline(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!("Status: Request exceeded write timeout of {:?}", limit);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "request timed out")
        }
    }
}

/// Serializes `body` as a 200 JSON response, or a 500 carrying the encoder error.
pub fn json_response<T: Serialize>(body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!("Status: Failed to encode response: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::SensorError;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    struct Fixed(EnvironmentReading);

    #[async_trait]
    impl EnvironmentSensor for Fixed {
        async fn read_environment(&self) -> Result<EnvironmentReading, SensorError> {
            Ok(self.0)
        }
    }

    struct Failing;

    #[async_trait]
    impl EnvironmentSensor for Failing {
        async fn read_environment(&self) -> Result<EnvironmentReading, SensorError> {
            Err(SensorError::Checksum {
                expected: 1,
                actual: 2,
            })
        }
    }

    struct Stalled(Duration);

    #[async_trait]
    impl EnvironmentSensor for Stalled {
        async fn read_environment(&self) -> Result<EnvironmentReading, SensorError> {
            tokio::time::sleep(self.0).await;
            Ok(EnvironmentReading {
                humidity: 1.0,
                temperature: 1.0,
            })
        }
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("sensor value not representable"))
        }
    }

    fn app(sensor: impl EnvironmentSensor + 'static, read: Duration, write: Duration) -> Router {
        router(
            ApiState {
                environment: Arc::new(sensor),
                read_timeout: read,
            },
            write,
        )
    }

    async fn get_root(app: Router) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_returns_reading() {
        let sensor = Fixed(EnvironmentReading {
            humidity: 45.0,
            temperature: 72.5,
        });
        let (status, body) =
            get_root(app(sensor, Duration::from_secs(5), Duration::from_secs(5))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["humidity"].as_f64(), Some(45.0));
        assert_eq!(body["temperature"].as_f64(), Some(72.5));
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_status_degrades_to_zero_on_sensor_error() {
        let (status, body) =
            get_root(app(Failing, Duration::from_secs(5), Duration::from_secs(5))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["humidity"].as_f64(), Some(0.0));
        assert_eq!(body["temperature"].as_f64(), Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_bounds_slow_reads_by_read_timeout() {
        let sensor = Stalled(Duration::from_secs(30));
        let (status, body) =
            get_root(app(sensor, Duration::from_secs(2), Duration::from_secs(5))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["temperature"].as_f64(), Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_equal_read_and_write_timeouts_still_degrade_to_zero() {
        let sensor = Stalled(Duration::from_secs(30));
        let (status, body) =
            get_root(app(sensor, Duration::from_secs(5), Duration::from_secs(5))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["humidity"].as_f64(), Some(0.0));
        assert_eq!(body["temperature"].as_f64(), Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_longer_than_write_is_clamped() {
        let sensor = Stalled(Duration::from_secs(30));
        let (status, body) =
            get_root(app(sensor, Duration::from_secs(60), Duration::from_secs(1))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["temperature"].as_f64(), Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_timeout_returns_json_500() {
        let slow = Router::new()
            .route(
                "/",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "late"
                }),
            )
            .layer(middleware::from_fn_with_state(
                Duration::from_secs(1),
                enforce_deadline,
            ));
        let (status, body) = get_root(slow).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "request timed out");
    }

    #[tokio::test]
    async fn test_encoding_failure_returns_well_formed_500() {
        let response = json_response(&Unencodable);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .contains("sensor value not representable")
        );
    }
}
