use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Group, GroupId, Membership, Profile, User, UserId, DEFAULT_ROLE};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

/// Error body. `detail` carries the same text as `message`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code: code.to_string(),
            detail: message.clone(),
            message,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    #[serde(default)]
    pub profile_json: Option<Profile>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

#[derive(Serialize, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: UserId,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// Raw paging parameters, checked against per-listing bounds before use.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: UserId,
    pub name: String,
    pub profile_json: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupResponse {
    pub group_id: GroupId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberResponse {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub role: String,
    pub joined_at: DateTime<Utc>,
    pub user: Option<UserResponse>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            profile_json: user.profile_json,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        Self {
            group_id: group.group_id,
            name: group.name,
            created_at: group.created_at,
            updated_at: group.updated_at,
        }
    }
}

impl From<Membership> for MemberResponse {
    fn from(Membership { member, user }: Membership) -> Self {
        Self {
            group_id: member.group_id,
            user_id: member.user_id,
            role: member.role,
            joined_at: member.joined_at,
            user: Some(user.into()),
        }
    }
}
