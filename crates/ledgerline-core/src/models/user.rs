// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

/// Account identity as returned by the auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The access/refresh pair returned by login and renewal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Full login response: token pair plus the account it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_login_response() {
        let json = r#"{
            "access_token": "aaa.bbb.ccc",
            "refresh_token": "ddd.eee.fff",
            "user": {
                "id": "60f7b1b3b3f3f3f3f3f3f3f3",
                "email": "user@example.com",
                "first_name": "John",
                "last_name": "Doe",
                "role": "user"
            }
        }"#;

        let parsed: LoginResponse =
            serde_json::from_str(json).expect("Failed to parse login response");
        assert_eq!(parsed.access_token, "aaa.bbb.ccc");
        assert_eq!(parsed.user.full_name(), "John Doe");
        assert_eq!(parsed.user.role, UserRole::User);
    }

    #[test]
    fn user_role_defaults_when_missing() {
        let json = r#"{
            "id": "1",
            "email": "a@b.c",
            "first_name": "A",
            "last_name": "B"
        }"#;
        let user: User = serde_json::from_str(json).expect("Failed to parse user");
        assert_eq!(user.role, UserRole::User);
    }
}
