//! Bearer-token identity. A missing or unusable token leaves the request
//! anonymous; routes that need an actor answer 403 on their own.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request};
use axum::{middleware::Next, response::Response};
use tracing::debug;

use crate::common::auth::Actor;
use crate::common::UserId;
use crate::domains::auth::{Claims, JwtService};

/// Identity vouched for by the host platform
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
    pub is_admin: bool,
    pub authorizations: Vec<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            is_admin: claims.is_admin,
            authorizations: claims.authorizations,
        }
    }
}

impl AuthUser {
    /// Valuator roles are per component, so actions resolve them later.
    pub fn to_actor(&self) -> Actor {
        Actor::new(self.user_id, self.is_admin).with_authorizations(self.authorizations.clone())
    }
}

/// Token from `Authorization`, with or without the `Bearer ` scheme.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    (!token.is_empty()).then_some(token)
}

pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let user = bearer_token(request.headers())
        .and_then(|token| match jwt_service.verify_token(token) {
            Ok(claims) => Some(AuthUser::from(claims)),
            Err(e) => {
                debug!(error = %e, "rejected bearer token");
                None
            }
        });

    match user {
        Some(user) => {
            debug!(user_id = %user.user_id, is_admin = user.is_admin, "request authenticated");
            request.extensions_mut().insert(user);
        }
        None => debug!("anonymous request"),
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_scheme_is_optional() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_claims_become_an_actor() {
        let service = JwtService::new("test_secret", "test_issuer".to_string());
        let token = service
            .create_token(UserId::new(7), true, vec!["id_documents".to_string()])
            .unwrap();

        let user = AuthUser::from(service.verify_token(&token).unwrap());
        assert_eq!(user.user_id, UserId::new(7));
        assert!(user.is_admin);
        assert!(user.to_actor().holds_all(&["id_documents".to_string()]));
    }

    #[test]
    fn test_token_from_another_issuer_is_rejected() {
        let other = JwtService::new("test_secret", "someone_else".to_string());
        let token = other.create_token(UserId::new(1), true, vec![]).unwrap();

        let service = JwtService::new("test_secret", "test_issuer".to_string());
        assert!(service.verify_token(&token).is_err());
    }
}
