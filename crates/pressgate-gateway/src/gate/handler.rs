use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response};
use dashmap::DashMap;

use pressgate_core::error::Result;
use pressgate_core::MetricKind;

/// Why a request was rejected. Passed to custom handlers and inserted into
/// the request extensions for the duration of that request.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureContext {
    pub reason: String,
    pub kind: MetricKind,
}

/// Custom rejection policy. Owns the response entirely, headers included;
/// it may also call `next` to let the request through.
#[async_trait]
pub trait PressureHandler: Send + Sync {
    fn name(&self) -> &'static str;
    async fn handle(&self, req: Request, ctx: PressureContext, next: Next) -> Result<Response>;
}

/// Named pressure handlers that config can refer to.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<&'static str, Arc<dyn PressureHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    pub fn register(&self, handler: Arc<dyn PressureHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PressureHandler>> {
        self.handlers.get(name).map(|h| Arc::clone(h.value()))
    }

    pub fn registered(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|e| *e.key()).collect()
    }
}
