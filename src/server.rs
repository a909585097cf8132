use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use log::{error, info};

use crate::config::ServerConfig;
use crate::data::{GenerationRequest, GenerationResult};
use crate::solver::ScheduleGenerator;

async fn generate_handler(
    State(generator): State<Arc<ScheduleGenerator>>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerationResult>, (StatusCode, String)> {
    // the search is CPU-bound, keep it off the async workers
    let result = tokio::task::spawn_blocking(move || generator.generate(&request))
        .await
        .map_err(|e| {
            error!("Generation worker failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    Ok(Json(result))
}

pub fn router(generator: Arc<ScheduleGenerator>) -> Router {
    Router::new()
        .route("/v1/schedules/generate", post(generate_handler))
        .with_state(generator)
}

pub async fn run_server(config: &ServerConfig, generator: Arc<ScheduleGenerator>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, router(generator)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::ids::SequentialIds;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        let config = EngineConfig {
            parallel: false,
            seed: Some(5),
            ..EngineConfig::default()
        };
        router(Arc::new(
            ScheduleGenerator::new(config).with_id_generator(SequentialIds::new("s")),
        ))
    }

    fn post_json(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/schedules/generate")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_schedule() {
        let employees: Vec<Value> = (1..=8)
            .map(|i| json!({"id": format!("e{}", i), "name": format!("Employee {}", i)}))
            .collect();
        let body = json!({"employees": employees, "weekStart": "2025-03-02"});

        let response = app().oneshot(post_json(body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value = body_json(response).await;
        assert_eq!(value["schedule"]["id"], "s-1");
        assert_eq!(value["schedule"]["weekStart"], "2025-03-02");
        assert_eq!(value["schedule"]["createdBy"], "system");
        assert_eq!(value["strategy"], "optimized");
        assert!(value["schedule"]["assignments"]["5"]["morning"].is_string());
        assert!(value["schedule"]["assignments"]["5"]["night"].is_null());
        assert_eq!(value["errors"], json!([]));
        assert!(value["optimizationScore"].is_i64());
    }

    #[tokio::test]
    async fn test_no_employees_is_a_result_not_a_failure() {
        let body = json!({"employees": [], "weekStart": "2025-03-02"});

        let response = app().oneshot(post_json(body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value = body_json(response).await;
        assert!(value["schedule"].is_null());
        assert_eq!(value["errors"].as_array().unwrap().len(), 1);
        assert_eq!(value["errors"][0]["type"], "error");
        assert!(value.get("strategy").is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let response = app().oneshot(post_json("{not json".to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
