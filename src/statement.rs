use thiserror::Error;

use crate::row::{Row, RowError};

#[derive(Debug, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PrepareError {
    #[error("ID must be positive.")]
    NegativeId,

    #[error("String is too long.")]
    StringTooLong,

    #[error("Syntax error. Could not parse statement.")]
    SyntaxError,

    #[error("Unrecognized keyword at start of '{0}'.")]
    Unrecognized(String),
}

impl From<RowError> for PrepareError {
    fn from(err: RowError) -> Self {
        match err {
            RowError::NegativeId(_) => PrepareError::NegativeId,
            RowError::StringTooLong { .. } => PrepareError::StringTooLong,
            RowError::InteriorNul { .. } => PrepareError::SyntaxError,
        }
    }
}

pub fn prepare_statement(input: &str) -> Result<Statement, PrepareError> {
    let mut parts = input.split_whitespace();
    match parts.next() {
        Some("insert") => prepare_insert(parts),
        Some("select") => Ok(Statement::Select),
        _ => Err(PrepareError::Unrecognized(input.to_string())),
    }
}

fn prepare_insert<'a>(mut args: impl Iterator<Item = &'a str>) -> Result<Statement, PrepareError> {
    let (id, username, email) = match (args.next(), args.next(), args.next()) {
        (Some(id), Some(username), Some(email)) => (id, username, email),
        _ => return Err(PrepareError::SyntaxError),
    };
    let id: i32 = id.parse().map_err(|_| PrepareError::SyntaxError)?;

    Ok(Statement::Insert(Row::new(id, username, email)?))
}
