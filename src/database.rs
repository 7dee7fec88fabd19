//! Opening a database file into a [`Table`] and writing it back on close.

use std::path::Path;

use log::{error, info};

use crate::pager::Pager;
use crate::table::{Table, TableError};
use crate::{PAGE_SIZE, ROW_SIZE, ROWS_PER_PAGE};

pub fn open_database<P>(filename: P) -> Result<Table, TableError>
where
    P: AsRef<Path>,
{
    let pager = Pager::open(filename)?;
    let num_rows = rows_in_file(pager.file_length());
    info!("database holds {} rows", num_rows);
    Ok(Table::new(pager, num_rows))
}

/// Flushes every resident page holding rows and closes the file.
pub fn close_database(table: Table) -> Result<(), TableError> {
    table.close()
}

/// Row count of a file written by this store.
///
/// Full pages leave their tail unused, so the count is taken page by page.
/// A trailing partial record is ignored.
fn rows_in_file(file_length: u64) -> usize {
    let full_pages = (file_length / PAGE_SIZE as u64) as usize;
    let tail = (file_length % PAGE_SIZE as u64) as usize;
    full_pages * ROWS_PER_PAGE + (tail / ROW_SIZE).min(ROWS_PER_PAGE)
}

impl Table {
    pub fn close(mut self) -> Result<(), TableError> {
        self.closed = true;
        self.flush_and_close()
    }

    fn flush_and_close(&mut self) -> Result<(), TableError> {
        let num_full_pages = self.num_rows / ROWS_PER_PAGE;
        let num_additional_rows = self.num_rows % ROWS_PER_PAGE;

        for page_num in 0..num_full_pages {
            // A page that was never loaded was never changed either.
            if self.pager.is_resident(page_num) {
                self.pager.flush_page(page_num, PAGE_SIZE)?;
                self.pager.release(page_num);
            }
        }

        if num_additional_rows > 0 && self.pager.is_resident(num_full_pages) {
            self.pager
                .flush_page(num_full_pages, num_additional_rows * ROW_SIZE)?;
            self.pager.release(num_full_pages);
        }

        self.pager.close()?;
        info!("closed database with {} rows", self.num_rows);
        Ok(())
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.flush_and_close() {
            error!("failed to flush table on drop: {}", e);
        }
    }
}
