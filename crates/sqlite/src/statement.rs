use crate::{Error, Result, Row};
use std::ffi::{CStr, CString, c_int, c_longlong};

pub struct Statement {
    stmt: *mut libsqlite3_sys::sqlite3_stmt,
}

impl Statement {
    pub fn new(stmt: *mut libsqlite3_sys::sqlite3_stmt) -> Self {
        Self { stmt }
    }

    pub fn bind_int64(&self, index: c_int, value: c_longlong) -> Result<()> {
        self.check_rc(unsafe { libsqlite3_sys::sqlite3_bind_int64(self.stmt, index, value) })?;
        Ok(())
    }

    pub fn bind_text(&self, index: c_int, value: &str) -> Result<()> {
        let c_str = CString::new(value)?;
        self.check_rc(unsafe {
            libsqlite3_sys::sqlite3_bind_text(self.stmt, index, c_str.as_ptr(), -1, libsqlite3_sys::SQLITE_TRANSIENT())
        })?;
        Ok(())
    }

    /// Binds a blob without copying it, the slice must stay alive until the statement is stepped.
    pub fn bind_blob(&self, index: c_int, value: &[u8]) -> Result<()> {
        let len = c_int::try_from(value.len())
            .map_err(|_| Error::InvalidArgument(format!("Blob of {} bytes is too large to bind", value.len())))?;
        self.check_rc(unsafe {
            libsqlite3_sys::sqlite3_bind_blob(
                self.stmt,
                index,
                value.as_ptr().cast::<std::ffi::c_void>(),
                len,
                libsqlite3_sys::SQLITE_STATIC(),
            )
        })?;
        Ok(())
    }

    pub fn reset(&self) -> Result<()> {
        self.check_rc(unsafe { libsqlite3_sys::sqlite3_reset(self.stmt) })?;
        Ok(())
    }

    pub fn step(&self) -> c_int {
        let mut rc = unsafe { libsqlite3_sys::sqlite3_step(self.stmt) };
        while rc == libsqlite3_sys::SQLITE_BUSY {
            std::thread::sleep(std::time::Duration::from_micros(1));
            rc = unsafe { libsqlite3_sys::sqlite3_step(self.stmt) };
        }
        rc
    }

    /// Steps a statement that is not expected to return rows.
    pub fn execute(&self) -> Result<()> {
        match self.step() {
            libsqlite3_sys::SQLITE_DONE => Ok(()),
            _ => Err(Error::DatabaseError(self.error_message())),
        }
    }

    /// Steps to the next result row, `None` once the statement is done.
    /// The row is only valid until the statement is stepped again.
    pub fn next_row(&self) -> Result<Option<Row>> {
        match self.step() {
            libsqlite3_sys::SQLITE_ROW => Ok(Some(Row::new(self.stmt))),
            libsqlite3_sys::SQLITE_DONE => Ok(None),
            _ => Err(Error::DatabaseError(self.error_message())),
        }
    }

    fn error_message(&self) -> String {
        let error_message = unsafe { libsqlite3_sys::sqlite3_errmsg(libsqlite3_sys::sqlite3_db_handle(self.stmt)) };
        let c_str = unsafe { CStr::from_ptr(error_message) };

        c_str.to_string_lossy().into_owned()
    }

    fn check_rc(&self, rc: c_int) -> Result<c_int> {
        if rc != libsqlite3_sys::SQLITE_OK && (rc != libsqlite3_sys::SQLITE_ROW && rc != libsqlite3_sys::SQLITE_DONE) {
            return Err(Error::DatabaseError(self.error_message()));
        }

        Ok(rc)
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        unsafe { libsqlite3_sys::sqlite3_finalize(self.stmt) };
    }
}
