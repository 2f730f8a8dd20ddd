use async_trait::async_trait;
use gatehouse_security::{Exchange, InterceptPoint, Interceptor};

/// Logs every rejected authentication with the client address and the
/// requested path, as fodder for external ban tooling.
pub struct FailedAuthLogger;

#[async_trait]
impl Interceptor for FailedAuthLogger {
    fn name(&self) -> &str {
        "failed-auth-logger"
    }

    fn intercept_point(&self) -> InterceptPoint {
        InterceptPoint::AfterFailedAuth
    }

    async fn handle(&self, exchange: &mut Exchange) {
        tracing::warn!(
            client = %exchange.client_addr(),
            method = %exchange.method(),
            path = exchange.path(),
            "authentication failed"
        );
    }
}
