//! Schema versioning for the dashboard database.
//!
//! Migration SQL is compiled into the binary with `include_str!` and applied
//! in version order; the `schema_version` table remembers what already ran.
//!
//! Databases from releases before this module existed carry the tables but
//! no version row: they were built by ad-hoc `CREATE TABLE` calls, and the
//! oldest of them lack the `image_url` column on `articles`. Adoption
//! recognizes such a file by its `articles` table, patches the column in,
//! and records the baseline as applied so its SQL never runs twice.

use rusqlite::Connection;

const MIGRATIONS: &[(i32, &str)] = &[(1, include_str!("migrations/001_baseline.sql"))];

fn ensure_version_table(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| format!("schema_version table could not be created: {e}"))
}

/// Highest version recorded so far, 0 for a blank file.
fn applied_version(conn: &Connection) -> Result<i32, String> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| format!("schema_version could not be read: {e}"))
}

/// Take ownership of a database created before versioning existed.
/// Returns true when an adoption happened.
fn adopt_unversioned_db(conn: &Connection) -> Result<bool, String> {
    if applied_version(conn)? > 0 {
        return Ok(false);
    }

    let has_articles: bool = conn
        .prepare("SELECT 1 FROM articles LIMIT 1")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);
    if !has_articles {
        return Ok(false);
    }

    patch_missing_image_url(conn)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )
    .map_err(|e| format!("adopting the unversioned database failed: {e}"))?;
    log::info!("Adopted an unversioned database as schema v1");
    Ok(true)
}

/// The very first releases created `articles` without `image_url`.
fn patch_missing_image_url(conn: &Connection) -> Result<(), String> {
    let mut stmt = conn
        .prepare("PRAGMA table_info(articles)")
        .map_err(|e| format!("articles columns could not be listed: {e}"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .and_then(|rows| rows.collect::<Result<Vec<String>, _>>())
        .map_err(|e| format!("articles columns could not be listed: {e}"))?;

    if !columns.iter().any(|c| c == "image_url") {
        conn.execute_batch("ALTER TABLE articles ADD COLUMN image_url TEXT NOT NULL DEFAULT ''")
            .map_err(|e| format!("image_url column could not be added: {e}"))?;
        log::info!("Patched image_url onto a legacy articles table");
    }
    Ok(())
}

/// Hot-copy the database to `<path>.bak` with SQLite's online backup API.
/// Runs only when at least one migration is about to apply.
fn backup(conn: &Connection) -> Result<(), String> {
    let db_path: String = conn
        .query_row("PRAGMA database_list", [], |row| row.get(2))
        .map_err(|e| format!("database path could not be resolved: {e}"))?;
    if db_path.is_empty() || db_path == ":memory:" {
        return Ok(());
    }

    let backup_path = format!("{db_path}.bak");
    let mut target = Connection::open(&backup_path)
        .map_err(|e| format!("backup file could not be opened: {e}"))?;
    rusqlite::backup::Backup::new(conn, &mut target)
        .and_then(|b| b.step(-1))
        .map_err(|e| format!("backup before migration failed: {e}"))?;

    log::info!("Backed up database to {backup_path}");
    Ok(())
}

/// Bring the schema up to date and return how many migrations ran.
///
/// A database stamped with a version this build has never heard of belongs
/// to a newer release; touching it would be destructive, so this errors out
/// instead.
pub fn apply_pending(conn: &Connection) -> Result<usize, String> {
    ensure_version_table(conn)?;
    adopt_unversioned_db(conn)?;

    let current = applied_version(conn)?;
    let newest = MIGRATIONS.last().map(|(v, _)| *v).unwrap_or(0);
    if current > newest {
        return Err(format!(
            "database schema v{current} is ahead of this build (knows up to v{newest}); \
             update GrowthDesk before opening it"
        ));
    }

    let pending: Vec<&(i32, &str)> = MIGRATIONS.iter().filter(|(v, _)| *v > current).collect();
    if pending.is_empty() {
        return Ok(0);
    }

    backup(conn)?;
    for (version, sql) in &pending {
        conn.execute_batch(sql)
            .map_err(|e| format!("migration v{version} failed: {e}"))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [*version],
        )
        .map_err(|e| format!("migration v{version} could not be recorded: {e}"))?;
        log::info!("Applied migration v{version}");
    }
    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> Connection {
        Connection::open_in_memory().expect("open in-memory")
    }

    #[test]
    fn test_blank_database_gets_the_baseline() {
        let conn = blank();
        assert_eq!(apply_pending(&conn).unwrap(), 1);
        assert_eq!(applied_version(&conn).unwrap(), 1);

        // Each table accepts a row shaped the way the code writes it.
        conn.execute(
            "INSERT INTO articles (title, url, source, section, image_url, scraped_at, created_at)
             VALUES ('t', 'https://example.com/a', 'mk', '경제', '', '2025-08-25T00:00:00Z', '2025-08-25T00:00:00Z')",
            [],
        )
        .expect("articles row");
        conn.execute(
            "INSERT INTO read_articles (url, read_at)
             VALUES ('https://example.com/a', '2025-08-25T00:00:00Z')",
            [],
        )
        .expect("read_articles row");
        conn.execute(
            "INSERT INTO books (title, author, my_rating, shelf, date_read, goodreads_id)
             VALUES ('Dune', 'Frank Herbert', 5, 'read', '2025-01-01', '')",
            [],
        )
        .expect("books row");
        conn.execute(
            "INSERT INTO recommendations (title, author, reason, category)
             VALUES ('Hyperion', 'Dan Simmons', 'scope', 'SF')",
            [],
        )
        .expect("recommendations row");
    }

    #[test]
    fn test_read_articles_url_is_unique() {
        let conn = blank();
        apply_pending(&conn).unwrap();
        conn.execute(
            "INSERT INTO read_articles (url, read_at) VALUES ('https://example.com/a', 'now')",
            [],
        )
        .expect("first insert");
        let dup = conn.execute(
            "INSERT INTO read_articles (url, read_at) VALUES ('https://example.com/a', 'later')",
            [],
        );
        assert!(dup.is_err(), "duplicate read URL must be rejected");
    }

    #[test]
    fn test_unversioned_database_is_adopted_and_patched() {
        let conn = blank();
        // An old release's handiwork: articles without image_url, data inside.
        conn.execute_batch(
            "CREATE TABLE articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                source TEXT NOT NULL,
                section TEXT NOT NULL DEFAULT '',
                scraped_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            INSERT INTO articles (title, url, source, section, scraped_at, created_at)
            VALUES ('legacy', 'https://example.com/l', 'mk', '', '2024-01-01', '2024-01-01');
            CREATE TABLE read_articles (id INTEGER PRIMARY KEY, url TEXT UNIQUE, read_at TEXT);",
        )
        .expect("seed old database");

        assert_eq!(
            apply_pending(&conn).unwrap(),
            0,
            "adoption records the baseline instead of running it"
        );
        assert_eq!(applied_version(&conn).unwrap(), 1);

        let image_url: String = conn
            .query_row(
                "SELECT image_url FROM articles WHERE title = 'legacy'",
                [],
                |row| row.get(0),
            )
            .expect("image_url exists after adoption");
        assert_eq!(image_url, "");
    }

    #[test]
    fn test_schema_from_the_future_is_refused() {
        let conn = blank();
        ensure_version_table(&conn).unwrap();
        conn.execute("INSERT INTO schema_version (version) VALUES (999)", [])
            .unwrap();

        let err = apply_pending(&conn).unwrap_err();
        assert!(err.contains("ahead of this build"), "{err}");
    }

    #[test]
    fn test_second_run_applies_nothing() {
        let conn = blank();
        assert_eq!(apply_pending(&conn).unwrap(), 1);
        assert_eq!(apply_pending(&conn).unwrap(), 0);
        assert_eq!(applied_version(&conn).unwrap(), 1);
    }

    #[test]
    fn test_backup_written_before_first_migration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("growthdesk.db");
        let conn = Connection::open(&db_path).expect("open db");
        conn.execute_batch("PRAGMA journal_mode=WAL;").unwrap();

        assert_eq!(apply_pending(&conn).unwrap(), 1);
        assert!(dir.path().join("growthdesk.db.bak").exists());
    }
}
