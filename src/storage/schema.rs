use rusqlite::Connection;

pub(crate) const DB_SCHEMA_VERSION: i64 = 1;

// Every statement is guarded with IF NOT EXISTS so re-applying is a no-op.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(name) <= 100),
    profile_json TEXT NOT NULL DEFAULT '{}'
        CHECK (json_valid(profile_json) AND json_type(profile_json) = 'object'),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
);

CREATE TABLE IF NOT EXISTS "groups" (
    group_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(name) <= 100),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
);

CREATE TABLE IF NOT EXISTS group_members (
    group_id INTEGER NOT NULL REFERENCES "groups"(group_id),
    user_id INTEGER NOT NULL REFERENCES users(user_id),
    role TEXT NOT NULL DEFAULT 'member' CHECK (length(role) <= 50),
    joined_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
    PRIMARY KEY (group_id, user_id)
);

CREATE INDEX IF NOT EXISTS group_members_user_idx
    ON group_members(user_id);

CREATE TRIGGER IF NOT EXISTS users_touch_updated_at
    AFTER UPDATE ON users FOR EACH ROW
BEGIN
    UPDATE users SET updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
    WHERE user_id = OLD.user_id;
END;

CREATE TRIGGER IF NOT EXISTS groups_touch_updated_at
    AFTER UPDATE ON "groups" FOR EACH ROW
BEGIN
    UPDATE "groups" SET updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
    WHERE group_id = OLD.group_id;
END;
"#;

/// Creates the relations if absent and stamps the schema version.
///
/// Refuses databases written by a newer schema.
pub(crate) fn apply(conn: &Connection) -> rusqlite::Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version > DB_SCHEMA_VERSION {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
            Some(format!(
                "database schema version mismatch ({version} > {DB_SCHEMA_VERSION}); please run with --reset option"
            )),
        ));
    }

    if version < DB_SCHEMA_VERSION {
        log::info!(
            "SQLite schema install: {} -> {}",
            version,
            DB_SCHEMA_VERSION
        );
    }

    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap()
    }

    #[test]
    fn apply_creates_all_relations() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();

        assert_eq!(table_names(&conn), vec!["group_members", "groups", "users"]);
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, DB_SCHEMA_VERSION);
    }

    #[test]
    fn apply_twice_is_a_noop() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();
        conn.execute("INSERT INTO users (name) VALUES ('alice')", [])
            .unwrap();

        apply(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn apply_refuses_newer_schema() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", 99).unwrap();

        let err = apply(&conn).expect_err("newer schema must be refused");
        let msg = err.to_string();
        assert!(msg.contains("database schema version mismatch"));
        assert!(msg.contains("--reset"));
    }

    #[test]
    fn schema_rejects_non_object_profiles() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();

        let err = conn
            .execute(
                "INSERT INTO users (name, profile_json) VALUES ('bob', '[1,2]')",
                [],
            )
            .unwrap_err();
        assert!(err.to_string().contains("CHECK constraint failed"));
    }

    #[test]
    fn schema_bounds_name_length_but_allows_empty() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();

        conn.execute("INSERT INTO users (name) VALUES ('')", []).unwrap();
        conn.execute(
            r#"INSERT INTO "groups" (name) VALUES (?1)"#,
            [&"g".repeat(100)],
        )
        .unwrap();

        let err = conn
            .execute(r#"INSERT INTO "groups" (name) VALUES (?1)"#, [&"g".repeat(101)])
            .unwrap_err();
        assert!(err.to_string().contains("CHECK constraint failed"));
    }

    #[test]
    fn schema_enforces_membership_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", true).unwrap();
        apply(&conn).unwrap();

        let err = conn
            .execute(
                "INSERT INTO group_members (group_id, user_id) VALUES (1, 1)",
                [],
            )
            .unwrap_err();
        assert!(err.to_string().contains("FOREIGN KEY constraint failed"));
    }
}
