use crate::types::{
    Group, GroupId, GroupMember, Membership, Page, Profile, StoreResult, User, UserId,
};

pub trait StorageRead {
    fn load_user(&self, id: UserId) -> StoreResult<Option<User>>;
    fn list_users(&self, page: Page) -> StoreResult<Vec<User>>;

    fn load_group(&self, id: GroupId) -> StoreResult<Option<Group>>;
    fn load_group_by_name(&self, name: &str) -> StoreResult<Option<Group>>;
    fn list_groups(&self, page: Page) -> StoreResult<Vec<Group>>;

    /// Members of a group joined with their user rows, in join order.
    fn list_members(&self, group_id: GroupId, page: Page) -> StoreResult<Vec<Membership>>;

    /// Groups the user belongs to, ordered by group id.
    fn list_groups_for_user(&self, user_id: UserId, page: Page) -> StoreResult<Vec<Group>>;
}

/// Inserts guarded by the schema's constraints.
///
/// A unique or primary-key violation comes back as `StoreError::DuplicateKey`
/// naming the rule; nothing is written in that case.
pub trait StorageWrite {
    fn insert_user(&self, name: &str, profile: &Profile) -> StoreResult<User>;
    fn insert_group(&self, name: &str) -> StoreResult<Group>;
    fn insert_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
        role: &str,
    ) -> StoreResult<GroupMember>;
}

/// One store transaction. Dropping it without `commit` rolls it back.
pub trait StorageTx: StorageRead + StorageWrite {
    fn commit(self) -> StoreResult<()>;
}

pub trait Storage {
    type Tx: StorageTx;

    /// Opens a transaction for reads only.
    fn begin_read(&self) -> StoreResult<Self::Tx>;

    /// Opens a transaction holding the write lock from its first statement.
    fn begin_write(&self) -> StoreResult<Self::Tx>;
}
