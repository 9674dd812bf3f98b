use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo::User;

/// Request body for creating a user. The password is optional; accounts
/// created without one cannot log in. A missing username defaults to the
/// email address.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    #[serde(default)]
    pub salary: i64,
}

/// Request body for updating a user. All fields are required; an omitted
/// field is a decode error, not a partial update.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    pub salary: i64,
}

/// Public representation of a user, exhaustive about what leaves the server.
/// There is deliberately no password field.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub salary: i64,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            name: u.name,
            email: u.email,
            salary: u.salary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_never_carries_a_password() {
        let response = UserResponse {
            id: Uuid::new_v4(),
            username: "ann".into(),
            name: "Ann".into(),
            email: "a@x.com".into(),
            salary: 100,
        };
        let json = serde_json::to_value(&response).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["id", "username", "name", "email", "salary"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj.len(), 5);
        assert!(!json.to_string().contains("password"));
    }

    #[test]
    fn create_request_defaults_salary_and_allows_missing_password() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"name":"Ann","email":"a@x.com"}"#).unwrap();
        assert_eq!(req.salary, 0);
        assert!(req.password.is_none());
        assert!(req.username.is_none());
    }

    #[test]
    fn update_request_requires_every_field() {
        let err = serde_json::from_str::<UpdateUserRequest>(r#"{"name":"Ann"}"#).unwrap_err();
        assert!(err.to_string().contains("email"));
    }
}
