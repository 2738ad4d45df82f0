use chrono::{DateTime, Utc};

pub type UserId = i64;

/// Free-form profile document attached to a user.
pub type Profile = serde_json::Map<String, serde_json::Value>;

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    pub profile_json: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
