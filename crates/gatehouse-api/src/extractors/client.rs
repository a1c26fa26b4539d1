//! Client metadata recorded alongside issued refresh tokens.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, header};

use gatehouse_entity::token::ClientMetadata;

/// User agent and source address of the request.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo(pub ClientMetadata);

/// Resolves the source address of a request.
///
/// The socket peer wins when the server was started with connect info;
/// otherwise the first `X-Forwarded-For` hop is used.
pub fn client_ip(extensions: &Extensions, headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return Some(addr.ip());
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.chars().take(512).collect());

        let ip_address = client_ip(&parts.extensions, &parts.headers).map(|ip| ip.to_string());

        Ok(ClientInfo(ClientMetadata::new(user_agent, ip_address)))
    }
}
