use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Bearer credentials the endpoint accepts, resolved from the configured
/// authentication factory or legacy realm.
#[derive(Debug, Clone)]
pub enum AuthPolicy {
    Bearer { source: String, tokens: HashSet<String> },
    Unsecured,
}

impl AuthPolicy {
    pub fn bearer(source: impl Into<String>, tokens: impl IntoIterator<Item = String>) -> Self {
        AuthPolicy::Bearer {
            source: source.into(),
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn is_secured(&self) -> bool {
        matches!(self, AuthPolicy::Bearer { .. })
    }

    fn accepts(&self, authorization: Option<&str>) -> bool {
        match self {
            AuthPolicy::Unsecured => true,
            AuthPolicy::Bearer { tokens, .. } => authorization
                .and_then(|value| value.strip_prefix("Bearer "))
                .is_some_and(|token| tokens.contains(token)),
        }
    }
}

pub async fn bearer_auth_middleware(
    State(policy): State<Arc<AuthPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if policy.accepts(authorization) {
        return next.run(request).await;
    }

    if let AuthPolicy::Bearer { source, .. } = policy.as_ref() {
        tracing::debug!(source = %source, path = %request.uri().path(), "Management request not authenticated");
    }

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer realm=\"management\"")],
    )
        .into_response()
}
