//! Identity Extractor
//!
//! Axum extractor pulling the gateway-asserted identity headers into a
//! [`CurrentUser`]

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{CurrentUser, Role, USER_ID_HEADER, USER_ROLE_HEADER};
use crate::core::ServerState;
use shared::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Check if already extracted earlier in the request
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(*user);
        }

        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());

        let Some(id) = id else {
            tracing::warn!(uri = %parts.uri, "request without caller identity");
            return Err(AppError::not_authenticated());
        };

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(|v| v.parse::<Role>())
            .unwrap_or(Ok(Role::User))
            .map_err(|_| AppError::not_authenticated())?;

        let user = CurrentUser { id, role };
        parts.extensions.insert(user);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::db::testing::test_pool;
    use crate::payments::gateway::MockGateway;
    use axum::http::Request;
    use shared::ErrorCode;
    use std::sync::Arc;

    async fn state() -> ServerState {
        ServerState::new(
            Config::with_overrides("/tmp/attar-test", 0),
            test_pool().await,
            Arc::new(MockGateway::new()),
        )
    }

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/cart");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_extracts_identity() {
        let state = state().await;
        let mut parts = parts(&[("x-user-id", "42"), ("x-user-role", "admin")]);
        let user = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(user.id, 42);
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_role_defaults_to_user() {
        let state = state().await;
        let mut parts = parts(&[("x-user-id", "7")]);
        let user = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn test_missing_identity_rejected() {
        let state = state().await;
        let mut parts = parts(&[]);
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_unknown_role_rejected() {
        let state = state().await;
        let mut parts = parts(&[("x-user-id", "7"), ("x-user-role", "root")]);
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
    }
}
