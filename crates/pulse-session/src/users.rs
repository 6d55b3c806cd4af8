//! Access to the users API (`/api/v1/users`).
//!
//! The API answers with either a bare record or a record wrapped in
//! `{ "data": ... }`, and ids may be numbers or strings. Both are
//! normalized here so the rest of the crate sees one [`User`] shape.

use std::sync::Arc;

use pulse_core::envelope::check_success;
use pulse_core::{Acknowledgement, ApiRequest, ApiTransport, DashboardError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

const USERS_PATH: &str = "/api/v1/users";

/// Access level of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

/// A user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    /// Only present in listings; never serialized back.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn active_by_default() -> bool {
    true
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// A single user as sent by the API, bare or wrapped.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserPayload {
    Wrapped { data: User },
    Bare(User),
}

impl UserPayload {
    pub fn into_user(self) -> User {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// A user listing, bare or wrapped.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum UserListPayload {
    Wrapped { data: Vec<User> },
    Bare(Vec<User>),
}

/// Filters of the user listing. Unset filters are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFilters {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserFilters {
    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .query_opt("email", self.email.as_deref())
            .query_opt("name", self.name.as_deref())
            .query_opt("role", self.role.map(|r| r.as_str()))
            .query_opt("is_active", self.is_active)
    }
}

/// Body of a user creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub affiliation: String,
}

impl UserCreate {
    /// Rejects blank required fields before any request is made.
    pub fn validate(&self) -> Result<(), DashboardError> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("password", &self.password),
            ("affiliation", &self.affiliation),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DashboardError::validation(
                    field,
                    format!("user {} is required", field),
                ));
            }
        }
        Ok(())
    }
}

/// Partial update of a user. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Client of the users API.
#[derive(Clone)]
pub struct UsersService {
    transport: Arc<dyn ApiTransport>,
}

impl UsersService {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Lists users matching `filters`.
    pub async fn list(&self, filters: &UserFilters) -> Result<Vec<User>, DashboardError> {
        let request = filters.apply(ApiRequest::get(USERS_PATH));
        let body = self.transport.send(&request).await?;
        check_success(&body)?;
        let payload: UserListPayload = serde_json::from_value(body)?;
        let users = match payload {
            UserListPayload::Wrapped { data } | UserListPayload::Bare(data) => data,
        };
        debug!(count = users.len(), "Users listed");
        Ok(users)
    }

    /// Fetches one user; `None` when the API does not know the id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, DashboardError> {
        let request = ApiRequest::get(user_path(id));
        match self.transport.send(&request).await {
            Ok(body) => Ok(Some(decode_user(body)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Creates a user after validating the required fields.
    pub async fn create(&self, user: &UserCreate) -> Result<User, DashboardError> {
        user.validate()?;
        let request = ApiRequest::post(USERS_PATH).json(serde_json::to_value(user)?);
        decode_user(self.transport.send(&request).await?)
    }

    pub async fn update(&self, id: &str, update: &UserUpdate) -> Result<User, DashboardError> {
        let request = ApiRequest::put(user_path(id)).json(serde_json::to_value(update)?);
        decode_user(self.transport.send(&request).await?)
    }

    /// Deletes a user. Returns the API's `success` flag.
    pub async fn delete(&self, id: &str) -> Result<bool, DashboardError> {
        let request = ApiRequest::delete(user_path(id));
        let body = self.transport.send(&request).await?;
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            return Ok(false);
        }
        Ok(Acknowledgement::decode(body)?.success)
    }
}

fn user_path(id: &str) -> String {
    format!("{}/{}", USERS_PATH, id)
}

fn decode_user(body: Value) -> Result<User, DashboardError> {
    check_success(&body)?;
    let payload: UserPayload = serde_json::from_value(body)?;
    Ok(payload.into_user())
}
