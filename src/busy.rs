use std::cell::Cell;

use crate::{FileError, Result};

/// Single-flight marker for one kind of operation on one owner.
#[derive(Debug, Default)]
pub struct BusyFlag {
    held: Cell<bool>,
}

/// Clears its flag when dropped, on success and error paths alike.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a BusyFlag,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.held.get()
    }

    pub fn acquire(&self, what: &'static str) -> Result<BusyGuard<'_>> {
        if self.held.replace(true) {
            return Err(FileError::Busy(what));
        }
        Ok(BusyGuard { flag: self })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.held.set(false);
    }
}
