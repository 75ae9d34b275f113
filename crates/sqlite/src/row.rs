use std::{
    ffi::{CStr, c_char, c_int, c_longlong},
    slice,
};

/// A result row, only valid until the owning statement is stepped again.
#[derive(Clone, Copy)]
pub struct Row {
    stmt: *mut libsqlite3_sys::sqlite3_stmt,
}

impl Row {
    pub fn new(stmt: *mut libsqlite3_sys::sqlite3_stmt) -> Self {
        Self { stmt }
    }

    pub fn column_is_null(&self, index: c_int) -> bool {
        unsafe { libsqlite3_sys::sqlite3_column_type(self.stmt, index) == libsqlite3_sys::SQLITE_NULL }
    }

    pub fn column_string(&self, index: c_int) -> Option<&str> {
        let data = unsafe { libsqlite3_sys::sqlite3_column_text(self.stmt, index) };
        if !data.is_null() {
            let c_str = unsafe { CStr::from_ptr(data.cast::<c_char>()) };
            return c_str.to_str().ok();
        }
        None
    }

    pub fn column_blob(&self, index: c_int) -> Option<&[u8]> {
        let data = unsafe { libsqlite3_sys::sqlite3_column_blob(self.stmt, index) };
        let size = unsafe { libsqlite3_sys::sqlite3_column_bytes(self.stmt, index) };
        if !data.is_null() && size > 0 {
            let data_slice = unsafe { slice::from_raw_parts(data.cast::<u8>(), size as usize) };
            return Some(data_slice);
        }
        None
    }

    pub fn column_int64(&self, index: c_int) -> c_longlong {
        unsafe { libsqlite3_sys::sqlite3_column_int64(self.stmt, index) }
    }
}
