//! Continuation cursors and page accumulation.
//!
//! A bank that has more data than fits in one response adds return code 3040 with an
//! opaque cursor as its parameter. The request is repeated with the cursor until a
//! response carries no cursor.

use std::fmt::Display;

use log::debug;

use crate::responses::{BankMessage, CODE_CONTINUATION};
use crate::Error;

/// Default upper bound on the number of pages followed.
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Opaque position marker issued by the bank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContinuationCursor(String);

impl ContinuationCursor {
    pub fn new(value: impl Into<String>) -> Self {
        ContinuationCursor(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContinuationCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cursor of the first 3040 message, if the bank announced more data.
pub fn continuation_cursor(messages: &[BankMessage]) -> Option<ContinuationCursor> {
    messages
        .iter()
        .filter(|message| message.code == CODE_CONTINUATION)
        .find_map(|message| message.parameters.first())
        .filter(|cursor| !cursor.is_empty())
        .map(ContinuationCursor::new)
}

/// Collects page fragments in request order, bounded by a maximum page count.
#[derive(Debug)]
pub struct PageCollector<T> {
    pages: Vec<T>,
    max_pages: usize,
}

impl<T> PageCollector<T> {
    pub fn new(max_pages: usize) -> Self {
        PageCollector {
            pages: Vec::new(),
            max_pages: max_pages.max(1),
        }
    }

    /// Append the fragment of the next page.
    pub fn push(&mut self, fragment: T) -> Result<(), Error> {
        self.reserve()?;
        self.pages.push(fragment);
        debug!("collected page {}/{}", self.pages.len(), self.max_pages);
        Ok(())
    }

    /// Fails if no further page may be requested.
    pub fn reserve(&self) -> Result<(), Error> {
        if self.pages.len() >= self.max_pages {
            return Err(Error::PaginationExceeded(self.max_pages));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn into_pages(self) -> Vec<T> {
        self.pages
    }
}

impl<T> Default for PageCollector<T> {
    fn default() -> Self {
        PageCollector::new(DEFAULT_MAX_PAGES)
    }
}
