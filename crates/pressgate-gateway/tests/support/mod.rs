//! Scripted metrics source and HTTP helpers for integration tests.

#![allow(dead_code)]

use axum::{body::Body, http::Request, response::Response, routing::get, Router};
use tower::ServiceExt;

use pressgate_core::{MemoryUsage, MetricsSource};
use pressgate_gateway::{
    app_state::AppState,
    config::{GatewayConfig, PressureConfig, ServerSection},
    gate::HandlerRegistry,
    router,
};

/// Fixed readings; delay mean equals the default resolution (0 ms lag).
#[derive(Clone, Copy)]
pub struct Scripted {
    pub delay_mean_ns: f64,
    pub memory: MemoryUsage,
    pub utilization: Option<f64>,
}

impl Scripted {
    pub fn calm() -> Self {
        Self {
            delay_mean_ns: 10_000_000.0,
            memory: MemoryUsage {
                heap_used_bytes: 5,
                resident_bytes: 5,
            },
            utilization: None,
        }
    }

    pub fn heap(heap_used_bytes: u64) -> Self {
        Self {
            memory: MemoryUsage {
                heap_used_bytes,
                resident_bytes: 5,
            },
            ..Self::calm()
        }
    }
}

impl MetricsSource for Scripted {
    fn event_loop_delay_mean(&mut self) -> f64 {
        self.delay_mean_ns
    }
    fn reset_event_loop_delay(&mut self) {}
    fn memory_usage(&mut self) -> MemoryUsage {
        self.memory
    }
    fn utilization_since_previous(&mut self) -> Option<f64> {
        self.utilization
    }
}

pub fn config(pressure: PressureConfig) -> GatewayConfig {
    GatewayConfig {
        version: 1,
        server: ServerSection::default(),
        pressure,
    }
}

/// Router with `GET /` returning `ok` behind the gate.
pub fn app(pressure: PressureConfig, source: Scripted, handlers: &HandlerRegistry) -> (AppState, Router) {
    let state = AppState::new(&config(pressure), move || source, handlers).unwrap();
    let routes = Router::new().route("/", get(|| async { "ok" }));
    let router = router::build_router(state.clone(), routes);
    (state, router)
}

pub async fn get_path(router: Router, path: &str) -> Response {
    router
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_string(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
