use rusqlite::{ffi, params, types::Type, Connection, OptionalExtension, Row};
use std::{path::Path, time::Duration};

use super::{
    schema,
    traits::{Storage, StorageRead, StorageTx, StorageWrite},
};
use crate::types::{
    Conflict, Group, GroupId, GroupMember, Membership, Page, Profile, StoreError, StoreResult,
    User, UserId,
};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

const USER_COLUMNS: &str = "user_id, name, profile_json, created_at, updated_at";
const GROUP_COLUMNS: &str = "group_id, name, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct SqliteStorage {
    pub path: String,
    busy_timeout: Duration,
}

/// A transaction on its own connection.
///
/// The connection lives exactly as long as the transaction; if it is dropped
/// before `commit` the open transaction is rolled back.
pub struct SqliteTx {
    conn: Connection,
}

impl StorageTx for SqliteTx {
    fn commit(self) -> StoreResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }
}

impl Drop for SqliteTx {
    fn drop(&mut self) {
        if self.conn.is_autocommit() {
            return;
        }
        if let Err(err) = self.conn.execute_batch("ROLLBACK") {
            log::warn!("rollback on drop failed: {}", err);
        }
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ffi::ErrorCode::ConstraintViolation
                && matches!(
                    e.extended_code,
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
    )
}

fn insert_error(err: rusqlite::Error, conflict: impl FnOnce() -> Conflict) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::DuplicateKey(conflict())
    } else {
        err.into()
    }
}

fn user_at(row: &Row<'_>, base: usize) -> rusqlite::Result<User> {
    let profile_text: String = row.get(base + 2)?;
    let profile_json = serde_json::from_str::<Profile>(&profile_text).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(base + 2, Type::Text, Box::new(err))
    })?;
    Ok(User {
        user_id: row.get(base)?,
        name: row.get(base + 1)?,
        profile_json,
        created_at: row.get(base + 3)?,
        updated_at: row.get(base + 4)?,
    })
}

fn map_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    user_at(row, 0)
}

fn map_group_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        group_id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn map_member_row(row: &Row<'_>) -> rusqlite::Result<GroupMember> {
    Ok(GroupMember {
        group_id: row.get(0)?,
        user_id: row.get(1)?,
        role: row.get(2)?,
        joined_at: row.get(3)?,
    })
}

fn map_membership_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    Ok(Membership {
        member: map_member_row(row)?,
        user: user_at(row, 4)?,
    })
}

fn db_load_user(conn: &Connection, id: UserId) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
        params![id],
        map_user_row,
    )
    .optional()
}

fn db_list_users(conn: &Connection, page: Page) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY user_id LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt
        .query_map(params![page.sql_limit(), page.sql_offset()], map_user_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_load_group(conn: &Connection, id: GroupId) -> rusqlite::Result<Option<Group>> {
    conn.query_row(
        &format!(r#"SELECT {GROUP_COLUMNS} FROM "groups" WHERE group_id = ?1"#),
        params![id],
        map_group_row,
    )
    .optional()
}

fn db_load_group_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<Group>> {
    conn.query_row(
        &format!(r#"SELECT {GROUP_COLUMNS} FROM "groups" WHERE name = ?1"#),
        params![name],
        map_group_row,
    )
    .optional()
}

fn db_list_groups(conn: &Connection, page: Page) -> rusqlite::Result<Vec<Group>> {
    let mut stmt = conn.prepare(&format!(
        r#"SELECT {GROUP_COLUMNS} FROM "groups" ORDER BY group_id LIMIT ?1 OFFSET ?2"#
    ))?;
    let rows = stmt
        .query_map(params![page.sql_limit(), page.sql_offset()], map_group_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_list_members(
    conn: &Connection,
    group_id: GroupId,
    page: Page,
) -> rusqlite::Result<Vec<Membership>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT gm.group_id, gm.user_id, gm.role, gm.joined_at,
               u.user_id, u.name, u.profile_json, u.created_at, u.updated_at
        FROM group_members gm
        JOIN users u ON u.user_id = gm.user_id
        WHERE gm.group_id = ?1
        ORDER BY gm.rowid
        LIMIT ?2 OFFSET ?3
        "#,
    )?;
    let rows = stmt
        .query_map(
            params![group_id, page.sql_limit(), page.sql_offset()],
            map_membership_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_list_groups_for_user(
    conn: &Connection,
    user_id: UserId,
    page: Page,
) -> rusqlite::Result<Vec<Group>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT g.group_id, g.name, g.created_at, g.updated_at
        FROM "groups" g
        JOIN group_members gm ON gm.group_id = g.group_id
        WHERE gm.user_id = ?1
        ORDER BY g.group_id
        LIMIT ?2 OFFSET ?3
        "#,
    )?;
    let rows = stmt
        .query_map(
            params![user_id, page.sql_limit(), page.sql_offset()],
            map_group_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_user(conn: &Connection, name: &str, profile_text: &str) -> rusqlite::Result<User> {
    conn.query_row(
        &format!("INSERT INTO users (name, profile_json) VALUES (?1, ?2) RETURNING {USER_COLUMNS}"),
        params![name, profile_text],
        map_user_row,
    )
}

fn db_insert_group(conn: &Connection, name: &str) -> rusqlite::Result<Group> {
    conn.query_row(
        &format!(r#"INSERT INTO "groups" (name) VALUES (?1) RETURNING {GROUP_COLUMNS}"#),
        params![name],
        map_group_row,
    )
}

fn db_insert_member(
    conn: &Connection,
    group_id: GroupId,
    user_id: UserId,
    role: &str,
) -> rusqlite::Result<GroupMember> {
    conn.query_row(
        r#"
        INSERT INTO group_members (group_id, user_id, role) VALUES (?1, ?2, ?3)
        RETURNING group_id, user_id, role, joined_at
        "#,
        params![group_id, user_id, role],
        map_member_row,
    )
}

impl StorageRead for SqliteTx {
    fn load_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(db_load_user(&self.conn, id)?)
    }

    fn list_users(&self, page: Page) -> StoreResult<Vec<User>> {
        Ok(db_list_users(&self.conn, page)?)
    }

    fn load_group(&self, id: GroupId) -> StoreResult<Option<Group>> {
        Ok(db_load_group(&self.conn, id)?)
    }

    fn load_group_by_name(&self, name: &str) -> StoreResult<Option<Group>> {
        Ok(db_load_group_by_name(&self.conn, name)?)
    }

    fn list_groups(&self, page: Page) -> StoreResult<Vec<Group>> {
        Ok(db_list_groups(&self.conn, page)?)
    }

    fn list_members(&self, group_id: GroupId, page: Page) -> StoreResult<Vec<Membership>> {
        Ok(db_list_members(&self.conn, group_id, page)?)
    }

    fn list_groups_for_user(&self, user_id: UserId, page: Page) -> StoreResult<Vec<Group>> {
        Ok(db_list_groups_for_user(&self.conn, user_id, page)?)
    }
}

impl StorageWrite for SqliteTx {
    fn insert_user(&self, name: &str, profile: &Profile) -> StoreResult<User> {
        let profile_text =
            serde_json::to_string(profile).map_err(|err| StoreError::InvalidData(err.to_string()))?;
        db_insert_user(&self.conn, name, &profile_text)
            .map_err(|err| insert_error(err, || Conflict::UserName(name.to_owned())))
    }

    fn insert_group(&self, name: &str) -> StoreResult<Group> {
        db_insert_group(&self.conn, name)
            .map_err(|err| insert_error(err, || Conflict::GroupName(name.to_owned())))
    }

    fn insert_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
        role: &str,
    ) -> StoreResult<GroupMember> {
        db_insert_member(&self.conn, group_id, user_id, role)
            .map_err(|err| insert_error(err, || Conflict::Membership { group_id, user_id }))
    }
}

impl Storage for SqliteStorage {
    type Tx = SqliteTx;

    fn begin_read(&self) -> StoreResult<Self::Tx> {
        self.begin("BEGIN DEFERRED")
    }

    fn begin_write(&self) -> StoreResult<Self::Tx> {
        self.begin("BEGIN IMMEDIATE")
    }
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Deletes the database file and its WAL side files.
    pub fn reset_all(&self) -> anyhow::Result<()> {
        for suffix in ["", "-wal", "-shm"] {
            let path = format!("{}{}", self.path, suffix);
            if Path::new(&path).exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    pub fn init(&self) -> StoreResult<()> {
        let conn = self.open()?;
        schema::apply(&conn)?;
        Ok(())
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }

    fn begin(&self, statement: &str) -> StoreResult<SqliteTx> {
        let conn = self.open()?;
        conn.execute_batch(statement)?;
        Ok(SqliteTx { conn })
    }
}
