use chrono::{DateTime, Utc};

use super::{User, UserId};

pub type GroupId = i64;

/// Role assigned when a join request does not name one.
pub const DEFAULT_ROLE: &str = "member";
pub const ROLE_MAX_LEN: usize = 50;

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub group_id: GroupId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single `(group_id, user_id)` membership row.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupMember {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

/// A membership row together with the user it points at.
///
/// The user is joined in at read time; storage only keeps the foreign key.
#[derive(Clone, Debug, PartialEq)]
pub struct Membership {
    pub member: GroupMember,
    pub user: User,
}
