//! Transport bridge mounting the security chain as axum middleware.
//!
//! The chain operates on its own [`Exchange`] rather than the raw hyper
//! request, so the bridge translates in both directions: request line,
//! headers and peer address in; termination status and response headers
//! (challenges, CORS, token headers) out. When the chain lets the
//! request through, the authenticated identity travels to handlers as a
//! request extension.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use gatehouse_security::{Account, Exchange, PluginRegistry};
use http::StatusCode;

use crate::chain::{SecurityChain, SecurityChainComponents};

/// Authenticated caller identity, inserted as a request extension for
/// requests the chain let through. Absent on anonymous requests that
/// were allowed anyway.
#[derive(Clone, Debug)]
pub struct Identity {
    pub account: Account,
    pub authenticated_by: String,
}

/// Shared middleware state: the linked chain (stages only, the axum
/// router is the terminal) and the registry it came from.
#[derive(Clone)]
pub struct SecuredState {
    chain: Arc<SecurityChain>,
}

impl SecuredState {
    #[must_use]
    pub fn new(components: &SecurityChainComponents) -> Self {
        let chain = SecurityChain::new(components.registry().clone(), components.stages(), None);
        Self {
            chain: Arc::new(chain),
        }
    }

    #[must_use]
    pub fn from_registry(registry: Arc<PluginRegistry>) -> Self {
        Self::new(&SecurityChainComponents::new(registry))
    }
}

/// The middleware itself; mount with
/// `axum::middleware::from_fn_with_state(state, security_middleware)`.
#[allow(clippy::needless_pass_by_value)] // axum extractors are taken by value
pub async fn security_middleware(
    State(state): State<SecuredState>,
    request: Request,
    next: Next,
) -> Response {
    let mut exchange = exchange_from_request(&request);

    if let Err(e) = state.chain.run(&mut exchange).await {
        tracing::error!(error = %e, "security chain failed");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    if exchange.is_complete() {
        return terminated_response(&exchange);
    }

    let mut request = request;
    if let (Some(account), Some(mechanism)) = (
        exchange.security().authenticated_account().cloned(),
        exchange.security().authenticated_by().map(str::to_owned),
    ) {
        request.extensions_mut().insert(Identity {
            account,
            authenticated_by: mechanism,
        });
    }

    let mut response = next.run(request).await;
    for (name, value) in exchange.response_headers() {
        response.headers_mut().append(name.clone(), value.clone());
    }
    response
}

fn exchange_from_request(request: &Request) -> Exchange {
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::LOCALHOST), |info| info.0.ip());

    let mut builder = Exchange::builder(request.method().clone(), request.uri().path())
        .client_addr(client_addr)
        .headers(request.headers().clone());
    if let Some(raw) = request.uri().query() {
        builder = builder.query_string(raw);
    }
    builder.build()
}

fn terminated_response(exchange: &Exchange) -> Response {
    let status = exchange
        .response_status()
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = status.into_response();
    for (name, value) in exchange.response_headers() {
        response.headers_mut().append(name.clone(), value.clone());
    }
    response
}
