//! Repository operations over users, groups and memberships.
//!
//! Every operation runs in exactly one store transaction. Existence checks
//! done before an insert only pick the error to report; the schema's unique
//! and foreign-key constraints are what keep the data consistent.

use crate::storage::{Storage, StorageRead, StorageTx, StorageWrite};
use crate::types::{
    Group, GroupId, Membership, Page, Profile, Resource, StoreError, StoreResult, User, UserId,
    GROUP_PAGE, MEMBER_PAGE, USER_GROUP_PAGE, USER_PAGE,
};

#[derive(Clone, Debug)]
pub struct Registry<S> {
    storage: S,
}

impl<S: Storage> Registry<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn create_user(&self, name: &str, profile: &Profile) -> StoreResult<User> {
        let tx = self.storage.begin_write()?;
        let user = tx.insert_user(name, profile)?;
        tx.commit()?;
        log::debug!("created user {} ({})", user.user_id, user.name);
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> StoreResult<User> {
        let tx = self.storage.begin_read()?;
        let user = require_user(&tx, id)?;
        tx.commit()?;
        Ok(user)
    }

    pub fn list_users(&self, page: Page) -> StoreResult<Vec<User>> {
        let tx = self.storage.begin_read()?;
        let users = tx.list_users(page.clamp_to(USER_PAGE))?;
        tx.commit()?;
        Ok(users)
    }

    pub fn create_group(&self, name: &str) -> StoreResult<Group> {
        let tx = self.storage.begin_write()?;
        let group = tx.insert_group(name)?;
        tx.commit()?;
        log::debug!("created group {} ({})", group.group_id, group.name);
        Ok(group)
    }

    pub fn get_group(&self, id: GroupId) -> StoreResult<Group> {
        let tx = self.storage.begin_read()?;
        let group = require_group(&tx, id)?;
        tx.commit()?;
        Ok(group)
    }

    pub fn get_group_by_name(&self, name: &str) -> StoreResult<Group> {
        let tx = self.storage.begin_read()?;
        let group = tx
            .load_group_by_name(name)?
            .ok_or_else(|| StoreError::NotFound(Resource::GroupNamed(name.to_owned())))?;
        tx.commit()?;
        Ok(group)
    }

    pub fn list_groups(&self, page: Page) -> StoreResult<Vec<Group>> {
        let tx = self.storage.begin_read()?;
        let groups = tx.list_groups(page.clamp_to(GROUP_PAGE))?;
        tx.commit()?;
        Ok(groups)
    }

    /// Adds `user_id` to `group_id` with `role` and returns the new row with
    /// the user's record attached.
    ///
    /// The group is checked before the user, so a request naming two missing
    /// entities reports the group.
    pub fn add_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
        role: &str,
    ) -> StoreResult<Membership> {
        let tx = self.storage.begin_write()?;
        require_group(&tx, group_id)?;
        let user = require_user(&tx, user_id)?;
        let member = tx.insert_member(group_id, user_id, role)?;
        tx.commit()?;
        log::debug!(
            "user {} joined group {} as {}",
            member.user_id,
            member.group_id,
            member.role
        );
        Ok(Membership { member, user })
    }

    pub fn list_members(&self, group_id: GroupId, page: Page) -> StoreResult<Vec<Membership>> {
        let tx = self.storage.begin_read()?;
        require_group(&tx, group_id)?;
        let members = tx.list_members(group_id, page.clamp_to(MEMBER_PAGE))?;
        tx.commit()?;
        Ok(members)
    }

    pub fn groups_for_user(&self, user_id: UserId, page: Page) -> StoreResult<Vec<Group>> {
        let tx = self.storage.begin_read()?;
        require_user(&tx, user_id)?;
        let groups = tx.list_groups_for_user(user_id, page.clamp_to(USER_GROUP_PAGE))?;
        tx.commit()?;
        Ok(groups)
    }
}

fn require_user<R: StorageRead>(tx: &R, id: UserId) -> StoreResult<User> {
    tx.load_user(id)?
        .ok_or(StoreError::NotFound(Resource::User(id)))
}

fn require_group<R: StorageRead>(tx: &R, id: GroupId) -> StoreResult<Group> {
    tx.load_group(id)?
        .ok_or(StoreError::NotFound(Resource::Group(id)))
}
