use std::fmt;

use thiserror::Error;

use super::{GroupId, UserId};

pub type StoreResult<T> = Result<T, StoreError>;

/// The entity a lookup failed to find.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resource {
    User(UserId),
    Group(GroupId),
    GroupNamed(String),
}

impl Resource {
    /// Human name of the entity kind, as shown to API callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::User(_) => "User",
            Resource::Group(_) | Resource::GroupNamed(_) => "Group",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::User(id) => write!(f, "user {id}"),
            Resource::Group(id) => write!(f, "group {id}"),
            Resource::GroupNamed(name) => write!(f, "group named {name:?}"),
        }
    }
}

/// The uniqueness rule a rejected insert would have broken.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("user name {0:?} is taken")]
    UserName(String),
    #[error("group name {0:?} is taken")]
    GroupName(String),
    #[error("user {user_id} is already a member of group {group_id}")]
    Membership { group_id: GroupId, user_id: UserId },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("duplicate key: {0}")]
    DuplicateKey(Conflict),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
                StoreError::InvalidData(format!("column {column}: {source}"))
            }
            other => StoreError::Sqlite(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let err = StoreError::NotFound(Resource::Group(4));
        assert_eq!(err.to_string(), "group 4 not found");

        let err = StoreError::NotFound(Resource::GroupNamed("eng".into()));
        assert_eq!(err.to_string(), "group named \"eng\" not found");

        let err = StoreError::DuplicateKey(Conflict::Membership {
            group_id: 1,
            user_id: 2,
        });
        assert_eq!(
            err.to_string(),
            "duplicate key: user 2 is already a member of group 1"
        );
    }

    #[test]
    fn conversion_failures_are_invalid_data() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StoreError = rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            Box::new(source),
        )
        .into();
        assert!(matches!(err, StoreError::InvalidData(msg) if msg.starts_with("column 2:")));

        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[test]
    fn resource_kind_groups_lookups_by_entity() {
        assert_eq!(Resource::User(1).kind(), "User");
        assert_eq!(Resource::Group(1).kind(), "Group");
        assert_eq!(Resource::GroupNamed("x".into()).kind(), "Group");
    }
}
