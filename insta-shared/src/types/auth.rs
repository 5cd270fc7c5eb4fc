use chrono::Utc;
use serde::{Deserialize, Serialize};

/// JWT claims minted by the auth service. `sub` is the user's numeric id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: i64, username: impl Into<String>, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            username: username.into(),
            iat: now,
            exp: now + duration_secs,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
        }
    }
}

/// The requester of a read operation. Anonymous viewers never like or
/// follow anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(i64),
}

impl Viewer {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(*id),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Viewer::Anonymous)
    }
}

impl From<&AuthUser> for Viewer {
    fn from(user: &AuthUser) -> Self {
        Viewer::User(user.id)
    }
}

impl From<Option<AuthUser>> for Viewer {
    fn from(user: Option<AuthUser>) -> Self {
        user.as_ref().map(Viewer::from).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_claims_are_not_expired() {
        let claims = Claims::new(7, "ada", 60);
        assert!(!claims.is_expired());
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn past_claims_are_expired() {
        let claims = Claims::new(7, "ada", -10);
        assert!(claims.is_expired());
    }

    #[test]
    fn viewer_from_optional_user() {
        let user = AuthUser { id: 3, username: "grace".into() };
        assert_eq!(Viewer::from(Some(user)), Viewer::User(3));
        assert_eq!(Viewer::from(None), Viewer::Anonymous);
        assert_eq!(Viewer::Anonymous.user_id(), None);
        assert!(Viewer::default().is_anonymous());
    }
}
