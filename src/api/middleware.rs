use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::db::{SessionRepository, UserRepository};
use crate::error::AppError;

/// Identity of the authorized caller, stored in request extensions by
/// [`session_guard`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
}

/// Resolve the caller's network address: first entry of `X-Forwarded-For`,
/// then the transport peer, then the literal "unknown".
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    if let Some(forwarded) = headers
        .get("X-Forwarded-For")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    peer.map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// The user identifier travels as a query parameter, with a cookie fallback.
fn user_id_from_request(request: &Request) -> Option<String> {
    let from_query = request.uri().query().and_then(|query| {
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix("user_id=").map(str::to_string))
    });

    from_query.or_else(|| {
        request
            .headers()
            .get(axum::http::header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|cookies| {
                cookies
                    .split(';')
                    .find_map(|cookie| cookie.trim().strip_prefix("user_id=").map(str::to_string))
            })
    })
}

/// Session middleware.
///
/// A request is authorized when a session row exists for the user. An address
/// mismatch is treated as the user having moved networks: the session is
/// silently re-issued for the current address and the request proceeds.
/// Missing or malformed identifiers, unknown users and absent sessions are
/// rejected.
pub async fn session_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = user_id_from_request(&request)
        .ok_or_else(|| AppError::Auth("Missing user identifier".to_string()))?;

    Uuid::parse_str(&user_id)
        .map_err(|_| AppError::Auth("Invalid user identifier".to_string()))?;

    let user = UserRepository::get_by_id(&state.db, &user_id)
        .await?
        .ok_or_else(|| AppError::Auth("User not found; the session may have expired".to_string()))?;

    let session = SessionRepository::get_by_user(&state.db, &user.id)
        .await?
        .ok_or_else(|| AppError::Auth("Session not found, please log in again".to_string()))?;

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let client_ip = resolve_client_ip(request.headers(), peer);

    if session.ip_address != client_ip {
        SessionRepository::issue(&state.db, &user.id, &client_ip).await?;
        tracing::debug!(user_id = %user.id, ip = %client_ip, "Session re-issued for new address");
    }

    request.extensions_mut().insert(CurrentUser { user_id: user.id });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", "10.0.0.1, 192.168.0.7".parse().unwrap());

        let ip = resolve_client_ip(&headers, Some("127.0.0.1".parse().unwrap()));
        assert_eq!(ip, "10.0.0.1");
    }

    #[test]
    fn test_peer_address_fallback() {
        let ip = resolve_client_ip(&HeaderMap::new(), Some("127.0.0.1".parse().unwrap()));
        assert_eq!(ip, "127.0.0.1");
    }

    #[test]
    fn test_unknown_when_nothing_available() {
        assert_eq!(resolve_client_ip(&HeaderMap::new(), None), "unknown");
    }
}
