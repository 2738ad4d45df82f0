mod error;
mod group;
mod page;
mod user;

pub use error::{Conflict, Resource, StoreError, StoreResult};
pub use group::{Group, GroupId, GroupMember, Membership, DEFAULT_ROLE, ROLE_MAX_LEN};
pub use page::{Page, PageBounds, GROUP_PAGE, MEMBER_PAGE, USER_GROUP_PAGE, USER_PAGE};
pub use user::{Profile, User, UserId};

/// Maximum length, in characters, of user and group names.
pub const NAME_MAX_LEN: usize = 100;
