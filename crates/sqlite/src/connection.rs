use crate::{AccessMode, Error, Result, Statement};
use std::ffi::{CStr, CString};
use std::os::raw::c_int;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

/// Owns a sqlite database handle, the handle is closed when the connection is dropped.
pub struct Connection {
    db: *mut libsqlite3_sys::sqlite3,
}

impl Connection {
    pub fn new(db_path: &Path, mode: AccessMode) -> Result<Self> {
        let mut db: *mut libsqlite3_sys::sqlite3 = std::ptr::null_mut();
        let c_path = CString::new(db_path.to_string_lossy().to_string())?;
        let rc = unsafe { libsqlite3_sys::sqlite3_open_v2(c_path.as_ptr(), &mut db, access_mode_flags(mode), std::ptr::null()) };
        if rc != libsqlite3_sys::SQLITE_OK {
            let error_message = Connection::last_sqlite_error(db);
            unsafe { libsqlite3_sys::sqlite3_close(db) };
            return Err(Error::DatabaseError(format!(
                "Failed to open '{}': {error_message}",
                db_path.to_string_lossy()
            )));
        }

        log::debug!("Opened sqlite database '{}'", db_path.to_string_lossy());
        Ok(Self { db })
    }

    /// Runs a single statement that produces no rows.
    pub fn execute(&self, sql: &str) -> Result<()> {
        self.prepare_statement(sql)?.execute()
    }

    pub fn prepare_statement(&self, sql: &str) -> Result<Statement> {
        let mut stmt: *mut libsqlite3_sys::sqlite3_stmt = std::ptr::null_mut();
        let c_sql = CString::new(sql)?;
        let mut rc =
            unsafe { libsqlite3_sys::sqlite3_prepare_v2(self.db, c_sql.as_ptr(), -1, &mut stmt, std::ptr::null_mut()) };
        while rc == libsqlite3_sys::SQLITE_BUSY {
            sleep(Duration::from_micros(1));
            rc = unsafe {
                libsqlite3_sys::sqlite3_prepare_v2(self.db, c_sql.as_ptr(), -1, &mut stmt, std::ptr::null_mut())
            };
        }
        if rc != libsqlite3_sys::SQLITE_OK {
            return Err(Error::DatabaseError(format!("{} ({sql})", self.last_error())));
        }

        Ok(Statement::new(stmt))
    }

    /// Executes a `;` separated list of statements, `--` comment lines are skipped.
    pub fn execute_sql_statements(&self, sql_contents: &str) -> Result<()> {
        sql_contents
            .split(';')
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("--"))
            .try_for_each(|line| self.execute(line))
    }

    /// Runs `body` inside a transaction, rolled back when the body fails.
    pub fn transaction<R>(&self, body: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        self.execute("BEGIN")?;
        match body(self) {
            Ok(result) => {
                self.execute("COMMIT")?;
                Ok(result)
            }
            Err(err) => {
                if let Err(rollback_err) = self.execute("ROLLBACK") {
                    log::warn!("Rollback failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }

    /// Number of rows modified by the most recent statement.
    pub fn changes(&self) -> usize {
        let count = unsafe { libsqlite3_sys::sqlite3_changes(self.db) };
        usize::try_from(count).unwrap_or(0)
    }

    pub fn last_error(&self) -> String {
        Connection::last_sqlite_error(self.db)
    }

    fn last_sqlite_error(db: *mut libsqlite3_sys::sqlite3) -> String {
        let error_message = unsafe { libsqlite3_sys::sqlite3_errmsg(db) };
        if error_message.is_null() {
            return String::from("unknown sqlite error");
        }
        let c_str = unsafe { CStr::from_ptr(error_message) };
        c_str.to_string_lossy().into_owned()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        unsafe { libsqlite3_sys::sqlite3_close(self.db) };
    }
}

fn access_mode_flags(mode: AccessMode) -> c_int {
    match mode {
        AccessMode::ReadOnly => libsqlite3_sys::SQLITE_OPEN_READONLY,
        AccessMode::ReadWrite => libsqlite3_sys::SQLITE_OPEN_READWRITE,
        AccessMode::Create => libsqlite3_sys::SQLITE_OPEN_READWRITE | libsqlite3_sys::SQLITE_OPEN_CREATE,
    }
}
