use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::errors::{AppError, ErrorCode};
use crate::types::auth::{AuthUser, Claims, Viewer};

/// Verifies HS256 bearer tokens issued by the auth service.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::new(ErrorCode::TokenExpired, "token has expired")
            }
            _ => AppError::new(ErrorCode::TokenInvalid, format!("invalid token: {e}")),
        })?;

        if token_data.claims.is_expired() {
            return Err(AppError::new(ErrorCode::TokenExpired, "token has expired"));
        }

        Ok(token_data.claims)
    }
}

/// Router state that can verify bearer tokens.
pub trait AuthState {
    fn jwt_verifier(&self) -> &JwtVerifier;
}

impl<T: AuthState> AuthState for Arc<T> {
    fn jwt_verifier(&self) -> &JwtVerifier {
        (**self).jwt_verifier()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: AuthState + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let claims = state.jwt_verifier().verify(&token)?;
        Ok(AuthUser::from(claims))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("invalid authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AppError::unauthorized("authorization header must use Bearer scheme"))
}

/// Optional auth extractor. A missing or unusable token yields an anonymous
/// requester instead of a rejection.
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl OptionalAuthUser {
    pub fn viewer(&self) -> Viewer {
        self.0.as_ref().map(Viewer::from).unwrap_or_default()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: AuthState + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(e) => {
                if parts.headers.contains_key("Authorization") {
                    tracing::debug!(error = %e, "ignoring unusable bearer token");
                }
                Ok(Self(None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    struct TestState {
        verifier: JwtVerifier,
    }

    impl AuthState for TestState {
        fn jwt_verifier(&self) -> &JwtVerifier {
            &self.verifier
        }
    }

    fn state() -> Arc<TestState> {
        Arc::new(TestState { verifier: JwtVerifier::new(SECRET) })
    }

    fn token(claims: &Claims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn parts(auth: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn valid_token_yields_user() {
        let bearer = format!("Bearer {}", token(&Claims::new(42, "ada", 300), SECRET));
        let user = AuthUser::from_request_parts(&mut parts(Some(bearer)), &state()).await.unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.username, "ada");
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let err = AuthUser::from_request_parts(&mut parts(None), &state()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn wrong_scheme_is_unauthorized() {
        let err = AuthUser::from_request_parts(&mut parts(Some("Basic abc".into())), &state())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn foreign_signature_is_invalid() {
        let bearer = format!("Bearer {}", token(&Claims::new(1, "mallory", 300), "other-secret"));
        let err = AuthUser::from_request_parts(&mut parts(Some(bearer)), &state()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenInvalid);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let bearer = format!("Bearer {}", token(&Claims::new(1, "old", -3600), SECRET));
        let err = AuthUser::from_request_parts(&mut parts(Some(bearer)), &state()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenExpired);
    }

    #[tokio::test]
    async fn optional_user_falls_back_to_anonymous() {
        let anon = OptionalAuthUser::from_request_parts(&mut parts(None), &state()).await.unwrap();
        assert_eq!(anon.viewer(), Viewer::Anonymous);

        let garbage = OptionalAuthUser::from_request_parts(&mut parts(Some("Bearer nope".into())), &state())
            .await
            .unwrap();
        assert_eq!(garbage.viewer(), Viewer::Anonymous);

        let bearer = format!("Bearer {}", token(&Claims::new(9, "lin", 300), SECRET));
        let known = OptionalAuthUser::from_request_parts(&mut parts(Some(bearer)), &state()).await.unwrap();
        assert_eq!(known.viewer(), Viewer::User(9));
    }
}
