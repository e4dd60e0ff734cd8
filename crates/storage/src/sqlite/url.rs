use std::path::{Path, PathBuf};

use super::SqliteInitError;

const MEMORY_URL: &str = "sqlite::memory:";

/// Turn `sqlite:relative.db` or a bare path into an absolute `sqlite://` URL.
/// `sqlite::memory:` and URLs that already use `sqlite://` pass through.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    if raw == MEMORY_URL || raw.starts_with("sqlite://") {
        return raw.to_owned();
    }

    let trimmed = raw.trim();
    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and parent directories) if it does not exist yet.
///
/// # Errors
///
/// Returns `SqliteInitError::InvalidUrl` unless `db_url` is `sqlite::memory:`
/// or a normalized `sqlite://` URL with a path.
/// Returns `SqliteInitError::Io` if the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), SqliteInitError> {
    if db_url == MEMORY_URL {
        return Ok(());
    }

    let invalid = || SqliteInitError::InvalidUrl(db_url.to_owned());
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        log::debug!("created database file {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_and_prefixed_paths_become_absolute() {
        assert_eq!(
            normalize_sqlite_url("sqlite:/tmp/q.sqlite3"),
            "sqlite:///tmp/q.sqlite3"
        );
        let relative = normalize_sqlite_url("quizzy.sqlite3");
        assert!(relative.starts_with("sqlite:///"));
        assert!(relative.ends_with("/quizzy.sqlite3"));
        assert_eq!(normalize_sqlite_url(MEMORY_URL), MEMORY_URL);
    }

    #[test]
    fn only_file_urls_are_prepared() {
        assert!(prepare_sqlite_file(MEMORY_URL).is_ok());
        assert!(matches!(
            prepare_sqlite_file("postgres://nope"),
            Err(SqliteInitError::InvalidUrl(_))
        ));
        assert!(matches!(
            prepare_sqlite_file("sqlite://?mode=rwc"),
            Err(SqliteInitError::InvalidUrl(_))
        ));
    }

    #[test]
    fn creates_missing_file_and_parents() {
        let dir = std::env::temp_dir().join(format!("quizzy-url-{}", std::process::id()));
        let file = dir.join("nested").join("db.sqlite3");
        let url = normalize_sqlite_url(&format!("sqlite:{}", file.display()));

        prepare_sqlite_file(&url).unwrap();
        assert!(file.exists());
        prepare_sqlite_file(&url).unwrap();

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
