//! Best-effort failure diagnostics.

use async_trait::async_trait;

/// Side-effecting diagnostic capture (screenshot, HTML dump) fired when a
/// cycle goes wrong.
///
/// Implementations must swallow their own failures; callers never branch on
/// the outcome, so the capture path cannot take the pipeline down with it.
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    async fn capture(&self, tag: &str);
}

/// Sink that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

#[async_trait]
impl DiagnosticSink for NoopDiagnostics {
    async fn capture(&self, _tag: &str) {}
}
