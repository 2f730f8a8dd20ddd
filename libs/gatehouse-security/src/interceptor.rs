use async_trait::async_trait;

use crate::exchange::Exchange;

/// Where an interceptor runs relative to the security phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptPoint {
    /// Before the mechanism chain runs.
    BeforeAuth,
    /// After the whole security phase passed.
    AfterAuth,
    /// After the terminal barrier failed the request, before the 401
    /// is written. An interceptor here may set its own error status
    /// (e.g. 429), which wins over the default 401.
    AfterFailedAuth,
}

/// Opaque hook invoked at a defined point of the security phase.
/// Interceptors have no return value; they observe or mutate the
/// exchange (headers, status).
#[async_trait]
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &str;

    fn intercept_point(&self) -> InterceptPoint;

    async fn handle(&self, exchange: &mut Exchange);
}
