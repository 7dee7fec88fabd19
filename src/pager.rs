use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::{PAGE_SIZE, TABLE_MAX_PAGES};

#[derive(Debug)]
pub struct Page {
    pub buffer: [u8; PAGE_SIZE],
}

impl Page {
    fn zeroed() -> Box<Self> {
        Box::new(Page {
            buffer: [0u8; PAGE_SIZE],
        })
    }
}

#[derive(Error, Debug)]
pub enum PagerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page {page_num} is out of bounds (max: {max})")]
    PageOutOfBounds { page_num: usize, max: usize },

    #[error("tried to flush page {0}, which is not loaded")]
    PageNotLoaded(usize),

    #[error("cannot flush {0} bytes, more than a whole page")]
    FlushTooLarge(usize),
}

/// Caches fixed-size pages of the backing file in memory.
///
/// Pages are read lazily on first access and are only written back through
/// [`Pager::flush_page`]; the pager itself knows nothing about rows.
pub struct Pager {
    file: File,
    file_length: u64,
    pages: Vec<Option<Box<Page>>>,
}

impl Pager {
    pub fn open<P>(filename: P) -> Result<Self, PagerError>
    where
        P: AsRef<Path>,
    {
        let path = filename.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let file_length = file.seek(SeekFrom::End(0))?;

        info!("opened {} ({} bytes)", path.display(), file_length);

        Ok(Pager {
            file,
            file_length,
            pages: (0..TABLE_MAX_PAGES).map(|_| None).collect(),
        })
    }

    /// Length of the backing file when it was opened.
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    /// Number of pages present in the file at open time, counting a partial
    /// trailing page as a whole one.
    pub fn num_pages(&self) -> usize {
        self.file_length.div_ceil(PAGE_SIZE as u64) as usize
    }

    pub fn is_resident(&self, page_num: usize) -> bool {
        matches!(self.pages.get(page_num), Some(Some(_)))
    }

    pub fn resident_pages(&self) -> usize {
        self.pages.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn get_page(&mut self, page_num: usize) -> Result<&mut Page, PagerError> {
        if page_num >= TABLE_MAX_PAGES {
            return Err(PagerError::PageOutOfBounds {
                page_num,
                max: TABLE_MAX_PAGES,
            });
        }

        if self.pages[page_num].is_none() {
            let mut page = Page::zeroed();

            // Pages past the end of the file have nothing on disk yet.
            if page_num < self.num_pages() {
                self.file
                    .seek(SeekFrom::Start((page_num * PAGE_SIZE) as u64))?;
                let read = read_up_to(&mut self.file, &mut page.buffer)?;
                debug!("loaded page {} ({} bytes from disk)", page_num, read);
            } else {
                debug!("allocated fresh page {}", page_num);
            }

            self.pages[page_num] = Some(page);
        }

        match self.pages[page_num].as_deref_mut() {
            Some(page) => Ok(page),
            None => Err(PagerError::PageNotLoaded(page_num)),
        }
    }

    /// Writes the first `byte_count` bytes of a resident page to its place in
    /// the file. The last page of a table is usually only partly occupied, so
    /// the table decides how many bytes are worth writing.
    pub fn flush_page(&mut self, page_num: usize, byte_count: usize) -> Result<(), PagerError> {
        if byte_count > PAGE_SIZE {
            return Err(PagerError::FlushTooLarge(byte_count));
        }

        let page = match self.pages.get(page_num) {
            Some(Some(page)) => page,
            _ => return Err(PagerError::PageNotLoaded(page_num)),
        };

        self.file
            .seek(SeekFrom::Start((page_num * PAGE_SIZE) as u64))?;
        self.file.write_all(&page.buffer[..byte_count])?;

        debug!("flushed page {} ({} bytes)", page_num, byte_count);
        Ok(())
    }

    /// Drops a resident page without writing it.
    pub fn release(&mut self, page_num: usize) {
        if let Some(slot) = self.pages.get_mut(page_num) {
            *slot = None;
        }
    }

    /// Syncs the file and drops every page still in memory, flushed or not.
    pub fn close(&mut self) -> Result<(), PagerError> {
        self.file.sync_all()?;
        self.pages.iter_mut().for_each(|slot| *slot = None);
        Ok(())
    }
}

// Like `read_exact`, except that hitting end of file early is not an error.
fn read_up_to(file: &mut File, buffer: &mut [u8]) -> Result<usize, std::io::Error> {
    let mut total = 0;
    while total < buffer.len() {
        match file.read(&mut buffer[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
