//! Viewer identity for view deduplication.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

/// Header carrying the client chain when behind a proxy.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Fallback key when no client address is known.
pub const UNKNOWN_VIEWER: &str = "unknown";

/// The key a view is deduplicated on.
///
/// Taken from the first `X-Forwarded-For` hop when it is an IP address, then
/// the peer address, then [`UNKNOWN_VIEWER`]. The key is always an address or
/// the fallback, so its length is bounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerKey(pub String);

impl ViewerKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|chain| chain.split(',').next())
            .and_then(|hop| hop.trim().parse::<IpAddr>().ok());

        match (forwarded, peer) {
            (Some(ip), _) => Self(ip.to_string()),
            (None, Some(addr)) => Self(addr.ip().to_string()),
            (None, None) => Self(UNKNOWN_VIEWER.to_string()),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ViewerKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self::from_parts(&parts.headers, peer))
    }
}
