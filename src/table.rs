use log::debug;
use thiserror::Error;

use crate::pager::{Pager, PagerError};
use crate::row::Row;
use crate::{ROW_SIZE, ROWS_PER_PAGE, TABLE_MAX_ROWS};

#[derive(Error, Debug)]
pub enum TableError {
    #[error("table full")]
    TableFull,

    #[error(transparent)]
    Pager(#[from] PagerError),
}

/// A single table of fixed-width rows stored back to back in pages.
///
/// The table only tracks how many rows exist; where a row lives is computed
/// from its index every time it is accessed.
pub struct Table {
    pub(crate) pager: Pager,
    pub(crate) num_rows: usize,
    pub(crate) closed: bool,
}

impl Table {
    pub fn new(pager: Pager, num_rows: usize) -> Self {
        Table {
            pager,
            num_rows,
            closed: false,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn is_full(&self) -> bool {
        self.num_rows >= TABLE_MAX_ROWS
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Returns the `ROW_SIZE` bytes holding row `row_num`, loading its page
    /// if needed.
    pub fn row_slot(&mut self, row_num: usize) -> Result<&mut [u8], TableError> {
        let page_num = row_num / ROWS_PER_PAGE;
        let byte_offset = (row_num % ROWS_PER_PAGE) * ROW_SIZE;

        let page = self.pager.get_page(page_num)?;
        Ok(&mut page.buffer[byte_offset..byte_offset + ROW_SIZE])
    }

    pub fn insert(&mut self, row: &Row) -> Result<(), TableError> {
        if self.is_full() {
            return Err(TableError::TableFull);
        }

        let row_num = self.num_rows;
        row.serialize(self.row_slot(row_num)?);
        self.num_rows += 1;

        debug!("inserted row {} (id {})", row_num, row.id);
        Ok(())
    }

    /// Iterates over every row in insertion order.
    pub fn rows(&mut self) -> Rows<'_> {
        Rows {
            table: self,
            next_row: 0,
        }
    }
}

pub struct Rows<'table> {
    table: &'table mut Table,
    next_row: usize,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row >= self.table.num_rows {
            return None;
        }

        let row_num = self.next_row;
        match self.table.row_slot(row_num) {
            Ok(slot) => {
                self.next_row += 1;
                Some(Ok(Row::deserialize(slot)))
            }
            Err(e) => {
                // Stop after the first failure instead of retrying the same page.
                self.next_row = self.table.num_rows;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.num_rows.saturating_sub(self.next_row);
        (remaining, Some(remaining))
    }
}
