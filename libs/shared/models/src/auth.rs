use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STAFF_ROLES: [&str; 2] = ["admin", "staff"];

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }

    /// Staff covers front-desk users as well as administrators.
    pub fn is_staff(&self) -> bool {
        self.role
            .as_deref()
            .map(|role| STAFF_ROLES.contains(&role))
            .unwrap_or(false)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: Option<&str>) -> User {
        User {
            id: "u-1".to_string(),
            email: None,
            name: None,
            role: role.map(str::to_string),
            created_at: None,
        }
    }

    #[test]
    fn test_staff_roles() {
        assert!(user_with_role(Some("admin")).is_staff());
        assert!(user_with_role(Some("staff")).is_staff());
        assert!(!user_with_role(Some("patient")).is_staff());
        assert!(!user_with_role(None).is_staff());
    }

    #[test]
    fn test_only_admin_is_admin() {
        assert!(user_with_role(Some("admin")).is_admin());
        assert!(!user_with_role(Some("staff")).is_admin());
    }
}
