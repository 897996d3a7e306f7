//! Restricts the payment callback route to the provider's published address ranges.

use std::net::{IpAddr, SocketAddr};
use std::task::{Context, Poll};

use axum::extract::connect_info::ConnectInfo;
use axum::http::{Extensions, HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::config::AllowedIps;

#[derive(Clone, Debug)]
pub struct CallbackAllowlistLayer {
    allowed: AllowedIps,
    trusted_proxies: usize,
}

impl CallbackAllowlistLayer {
    /// `trusted_proxies` is the number of reverse proxies in front of the
    /// service whose `x-forwarded-for` entries are trusted.
    pub fn new(allowed: AllowedIps, trusted_proxies: usize) -> Self {
        Self {
            allowed,
            trusted_proxies,
        }
    }
}

impl<S> Layer<S> for CallbackAllowlistLayer {
    type Service = CallbackAllowlist<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CallbackAllowlist {
            inner,
            allowed: self.allowed.clone(),
            trusted_proxies: self.trusted_proxies,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CallbackAllowlist<S> {
    inner: S,
    allowed: AllowedIps,
    trusted_proxies: usize,
}

impl<S, B> Service<Request<B>> for CallbackAllowlist<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        if let AllowedIps::Cidrs(cidrs) = &self.allowed {
            let peer = client_ip(req.headers(), req.extensions(), self.trusted_proxies);
            let permitted = peer.is_some_and(|ip| cidrs.iter().any(|net| net.contains(&ip)));

            if !permitted {
                tracing::warn!(peer = ?peer, "payment callback from address outside provider ranges");
                return Box::pin(async { Ok(StatusCode::FORBIDDEN.into_response()) });
            }
        }

        // take the service that was driven to readiness, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await })
    }
}

/// The connecting address, or the entry `trusted_proxies` hops from the end of
/// `x-forwarded-for` when running behind proxies.
fn client_ip(headers: &HeaderMap, extensions: &Extensions, trusted_proxies: usize) -> Option<IpAddr> {
    if trusted_proxies > 0 {
        return forwarded_ip(headers, trusted_proxies);
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn forwarded_ip(headers: &HeaderMap, trusted_proxies: usize) -> Option<IpAddr> {
    let chain: Vec<IpAddr> = headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            entry
                .parse::<IpAddr>()
                .ok()
                .or_else(|| entry.parse::<SocketAddr>().ok().map(|a| a.ip()))
        })
        .collect();

    let index = chain.len().checked_sub(trusted_proxies)?;
    chain.get(index).copied()
}
