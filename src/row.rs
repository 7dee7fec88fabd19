//! Fixed-width binary layout of a single row.
//!
//! A row occupies [`ROW_SIZE`] bytes: a little-endian `i32` id followed by
//! the username and email slots. A text field is copied byte for byte, up to
//! its column limit, and the rest of its slot is zero-filled. Every slot is one
//! byte longer than its column, so the last byte is always a zero terminator.

use std::fmt;

use thiserror::Error;

use crate::{
    COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE, EMAIL_OFFSET, EMAIL_SIZE, ID_OFFSET, ID_SIZE,
    ROW_SIZE, USERNAME_OFFSET, USERNAME_SIZE,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RowError {
    #[error("id {0} is negative")]
    NegativeId(i32),

    #[error("{field} is {len} bytes long (max: {max})")]
    StringTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} contains a NUL byte")]
    InteriorNul { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl Row {
    /// Builds a row that is guaranteed to survive a serialize/deserialize
    /// round trip unchanged.
    pub fn new(
        id: i32,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, RowError> {
        let username = username.into();
        let email = email.into();

        if id < 0 {
            return Err(RowError::NegativeId(id));
        }
        check_text("username", &username, COLUMN_USERNAME_SIZE)?;
        check_text("email", &email, COLUMN_EMAIL_SIZE)?;

        Ok(Self {
            id,
            username,
            email,
        })
    }

    /// Writes the row into `destination`, which must be at least
    /// [`ROW_SIZE`] bytes long.
    pub fn serialize(&self, destination: &mut [u8]) {
        let destination = &mut destination[..ROW_SIZE];

        destination[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        write_text(
            &mut destination[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE],
            &self.username,
        );
        write_text(
            &mut destination[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE],
            &self.email,
        );
    }

    /// Reads a row back from `source`, which must be at least [`ROW_SIZE`]
    /// bytes long.
    pub fn deserialize(source: &[u8]) -> Self {
        let source = &source[..ROW_SIZE];

        let mut id_bytes = [0u8; ID_SIZE];
        id_bytes.copy_from_slice(&source[ID_OFFSET..ID_OFFSET + ID_SIZE]);

        Self {
            id: i32::from_le_bytes(id_bytes),
            username: read_text(&source[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]),
            email: read_text(&source[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

// A zero byte would be read back as the end of the field.
fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), RowError> {
    if value.contains('\0') {
        Err(RowError::InteriorNul { field })
    } else if value.len() > max {
        Err(RowError::StringTooLong {
            field,
            len: value.len(),
            max,
        })
    } else {
        Ok(())
    }
}

// The final byte of `slot` is the terminator and is never overwritten by data.
fn write_text(slot: &mut [u8], value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(slot.len() - 1);
    slot[..len].copy_from_slice(&bytes[..len]);
    slot[len..].fill(0);
}

fn read_text(slot: &[u8]) -> String {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..end]).into_owned()
}
