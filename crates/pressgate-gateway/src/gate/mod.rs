//! Request admission gate.
//!
//! `Gate::configure` validates the pressure settings, resolves the optional
//! custom handler, and starts the sampler only when at least one threshold is
//! active. Evaluation reads the latest published snapshot and never waits on
//! the sampler.

pub mod handler;
pub mod middleware;
pub mod responder;

use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use pressgate_core::error::{PressGateError, Result};
use pressgate_core::{MetricSnapshot, MetricsSource, PressureVerdict, Thresholds};

use crate::config::PressureConfig;
use crate::obs::GateMetrics;
use crate::sampler::{Sampler, SamplerSettings};

pub use handler::{HandlerRegistry, PressureContext, PressureHandler};
pub use middleware::pressure_gate;

/// What happens to a rejected request.
enum Rejection {
    Default { retry_after_secs: u64, message: String },
    Custom(Arc<dyn PressureHandler>),
}

enum Mode {
    /// Every check disabled: admit everything, no sampler.
    Disabled,
    Active {
        thresholds: Thresholds,
        sampler: Sampler,
        rejection: Rejection,
    },
}

struct GateInner {
    mode: Mode,
    metrics: Arc<GateMetrics>,
}

/// Cheap to clone; all clones share one sampler.
#[derive(Clone)]
pub struct Gate {
    inner: Arc<GateInner>,
}

impl Gate {
    /// Build a gate from config. `source` is only called when a check is
    /// active, so a disabled gate never starts any sampling work.
    ///
    /// Fails with `InvalidConfiguration` on bad settings or when
    /// `pressure_handler` names a handler missing from `registry`, and with
    /// `Internal` when a check is active but no tokio runtime is running
    /// (the sampler and the system source spawn tasks).
    pub fn configure<S, F>(cfg: &PressureConfig, source: F, registry: &HandlerRegistry) -> Result<Self>
    where
        S: MetricsSource,
        F: FnOnce() -> S,
    {
        cfg.validate()?;

        let custom = match &cfg.pressure_handler {
            Some(name) => Some(registry.get(name).ok_or_else(|| {
                PressGateError::InvalidConfiguration(format!(
                    "pressure_handler {name} is not registered (registered: {:?})",
                    registry.registered()
                ))
            })?),
            None => None,
        };

        let thresholds = cfg.thresholds();
        if cfg.disable_check || thresholds.is_disabled() {
            let reason = if cfg.disable_check { "disable_check" } else { "no thresholds" };
            tracing::info!(reason, "pressure gate installed as no-op");
            return Ok(Self::disabled());
        }

        if tokio::runtime::Handle::try_current().is_err() {
            return Err(PressGateError::Internal(
                "pressure gate must be configured inside a tokio runtime".into(),
            ));
        }

        let metrics: Arc<GateMetrics> = Arc::default();
        let settings = SamplerSettings {
            interval: cfg.sample_interval(),
            resolution_ms: cfg.resolution_ms as f64,
        };
        let sampler = Sampler::start(settings, source(), thresholds, Arc::clone(&metrics));

        let rejection = match custom {
            Some(h) => Rejection::Custom(h),
            None => Rejection::Default {
                retry_after_secs: cfg.retry_after_secs,
                message: cfg.message.clone(),
            },
        };

        Ok(Self {
            inner: Arc::new(GateInner {
                mode: Mode::Active {
                    thresholds,
                    sampler,
                    rejection,
                },
                metrics,
            }),
        })
    }

    /// Gate that admits everything.
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(GateInner {
                mode: Mode::Disabled,
                metrics: Arc::default(),
            }),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.inner.mode, Mode::Active { .. })
    }

    pub fn metrics(&self) -> &GateMetrics {
        &self.inner.metrics
    }

    /// Latest snapshot; `None` for a disabled gate.
    pub fn snapshot(&self) -> Option<MetricSnapshot> {
        match &self.inner.mode {
            Mode::Disabled => None,
            Mode::Active { sampler, .. } => Some(sampler.latest()),
        }
    }

    pub fn evaluate(&self) -> PressureVerdict {
        match &self.inner.mode {
            Mode::Disabled => PressureVerdict::admit(),
            Mode::Active { thresholds, sampler, .. } => {
                pressgate_core::evaluate(&sampler.latest(), thresholds)
            }
        }
    }

    /// Out-of-band pressure query (health checks, probes). No side effects.
    pub fn is_under_pressure(&self) -> bool {
        match &self.inner.mode {
            Mode::Disabled => false,
            Mode::Active { thresholds, sampler, .. } => {
                pressgate_core::is_under_pressure(&sampler.latest(), thresholds)
            }
        }
    }

    /// Stop sampling. Idempotent; the last published snapshot stays readable.
    pub fn stop(&self) {
        if let Mode::Active { sampler, .. } = &self.inner.mode {
            sampler.stop();
        }
    }

    /// Admit the request or apply the rejection policy.
    pub async fn on_request(&self, mut req: Request, verdict: PressureVerdict, next: Next) -> Response {
        let metrics = &self.inner.metrics;
        let rejection = match &self.inner.mode {
            Mode::Active { rejection, .. } if verdict.under_pressure => rejection,
            _ => {
                metrics.decisions.admit();
                return next.run(req).await;
            }
        };
        metrics.decisions.reject(verdict.kind);

        let ctx = PressureContext {
            reason: verdict.reason.unwrap_or_default(),
            kind: verdict.kind,
        };
        tracing::debug!(kind = ctx.kind.as_str(), reason = %ctx.reason, path = %req.uri().path(), "request rejected");

        match rejection {
            Rejection::Default { retry_after_secs, message } => {
                responder::default_rejection(*retry_after_secs, message)
            }
            Rejection::Custom(handler) => {
                req.extensions_mut().insert(ctx.clone());
                match handler.handle(req, ctx, next).await {
                    Ok(resp) => resp,
                    Err(e) => {
                        tracing::error!(handler = handler.name(), code = e.code().as_str(), error = %e, "pressure handler failed");
                        metrics
                            .handler_errors
                            .inc(&[("handler", handler.name()), ("code", e.code().as_str())]);
                        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
                    }
                }
            }
        }
    }

    /// Prometheus text for `/metrics`.
    pub fn render_metrics(&self) -> String {
        self.inner
            .metrics
            .render(self.snapshot().as_ref(), self.is_under_pressure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressgate_core::MemoryUsage;

    struct Fixed(MemoryUsage);

    impl MetricsSource for Fixed {
        fn event_loop_delay_mean(&mut self) -> f64 {
            10_000_000.0
        }
        fn reset_event_loop_delay(&mut self) {}
        fn memory_usage(&mut self) -> MemoryUsage {
            self.0
        }
        fn utilization_since_previous(&mut self) -> Option<f64> {
            Some(0.5)
        }
    }

    fn heavy() -> Fixed {
        Fixed(MemoryUsage {
            heap_used_bytes: 4096,
            resident_bytes: 8192,
        })
    }

    #[tokio::test]
    async fn no_thresholds_never_starts_sampler() {
        let mut called = false;
        let gate = Gate::configure(
            &PressureConfig::default(),
            || {
                called = true;
                heavy()
            },
            &HandlerRegistry::new(),
        )
        .unwrap();
        assert!(!called);
        assert!(!gate.is_active());
        assert!(gate.snapshot().is_none());
        assert!(!gate.evaluate().under_pressure);
        assert!(!gate.is_under_pressure());
    }

    #[tokio::test]
    async fn disable_check_wins_over_thresholds() {
        let cfg = PressureConfig {
            max_heap_used_bytes: 10,
            disable_check: true,
            ..PressureConfig::default()
        };
        let mut called = false;
        let gate = Gate::configure(
            &cfg,
            || {
                called = true;
                heavy()
            },
            &HandlerRegistry::new(),
        )
        .unwrap();
        assert!(!called);
        assert!(!gate.is_under_pressure());
    }

    #[tokio::test]
    async fn unknown_handler_is_invalid_configuration() {
        let cfg = PressureConfig {
            max_heap_used_bytes: 10,
            pressure_handler: Some("missing".into()),
            ..PressureConfig::default()
        };
        let err = Gate::configure(&cfg, heavy, &HandlerRegistry::new()).err().unwrap();
        assert!(matches!(err, PressGateError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn unknown_handler_fails_even_when_disabled() {
        let cfg = PressureConfig {
            disable_check: true,
            pressure_handler: Some("missing".into()),
            ..PressureConfig::default()
        };
        assert!(Gate::configure(&cfg, heavy, &HandlerRegistry::new()).is_err());
    }

    #[tokio::test]
    async fn evaluate_and_query_agree_under_pressure() {
        let cfg = PressureConfig {
            max_heap_used_bytes: 10,
            ..PressureConfig::default()
        };
        let gate = Gate::configure(&cfg, heavy, &HandlerRegistry::new()).unwrap();
        let v = gate.evaluate();
        assert!(v.under_pressure);
        assert_eq!(v.kind, pressgate_core::MetricKind::HeapUsed);
        assert!(gate.is_under_pressure());

        let snap = gate.snapshot().unwrap();
        assert_eq!(snap.heap_used_bytes, 4096);
        assert_eq!(snap.event_loop_delay_ms, 0.0);
        assert_eq!(snap.utilization, 0.5);

        gate.stop();
        gate.stop();
        assert!(gate.is_under_pressure());
    }

    #[test]
    fn active_gate_outside_runtime_is_an_error() {
        let cfg = PressureConfig {
            max_heap_used_bytes: 10,
            ..PressureConfig::default()
        };
        let mut called = false;
        let err = Gate::configure(
            &cfg,
            || {
                called = true;
                heavy()
            },
            &HandlerRegistry::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, PressGateError::Internal(_)));
        assert!(!called);
    }

    #[test]
    fn disabled_gate_needs_no_runtime() {
        let gate = Gate::configure(&PressureConfig::default(), heavy, &HandlerRegistry::new()).unwrap();
        assert!(!gate.is_active());
    }

    #[tokio::test]
    async fn utilization_threshold_applies() {
        let cfg = PressureConfig {
            max_utilization: 0.4,
            ..PressureConfig::default()
        };
        let gate = Gate::configure(&cfg, heavy, &HandlerRegistry::new()).unwrap();
        assert_eq!(gate.evaluate().kind, pressgate_core::MetricKind::Utilization);
    }
}
