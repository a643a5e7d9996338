//! A value that may or may not be present.
//!
//! Terminal operations that can come up empty (`find_first`, `reduce`, `max_by`, ...)
//! hand back an [`Optional`]. Reading it without checking goes through
//! [`Optional::get`], which reports [`StreamError::NoSuchElement`] instead of
//! panicking. A chain of [`Optional::flat_map`] calls walks nested fields and stops
//! at the first missing link.

use crate::error::{Result, StreamError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Optional<T>(Option<T>);

impl<T> Optional<T> {
    pub fn of(value: T) -> Self {
        Optional(Some(value))
    }

    pub fn empty() -> Self {
        Optional(None)
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Returns the value, or `NoSuchElement` when absent.
    pub fn get(self) -> Result<T> {
        self.0.ok_or(StreamError::NoSuchElement)
    }

    pub fn as_ref(&self) -> Optional<&T> {
        Optional(self.0.as_ref())
    }

    pub fn if_present<F: FnOnce(T)>(self, action: F) {
        if let Some(value) = self.0 {
            action(value);
        }
    }

    pub fn if_present_or_else<F, E>(self, action: F, otherwise: E)
    where
        F: FnOnce(T),
        E: FnOnce(),
    {
        match self.0 {
            Some(value) => action(value),
            None => otherwise(),
        }
    }

    pub fn or_else(self, other: T) -> T {
        self.0.unwrap_or(other)
    }

    pub fn or_else_get<F: FnOnce() -> T>(self, supplier: F) -> T {
        self.0.unwrap_or_else(supplier)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, mapper: F) -> Optional<U> {
        Optional(self.0.map(mapper))
    }

    pub fn filter<P: FnOnce(&T) -> bool>(self, predicate: P) -> Optional<T> {
        Optional(self.0.filter(predicate))
    }

    /// Bind: the mapper itself decides whether a value comes out.
    pub fn flat_map<U, F: FnOnce(T) -> Optional<U>>(self, mapper: F) -> Optional<U> {
        match self.0 {
            Some(value) => mapper(value),
            None => Optional(None),
        }
    }

    pub fn into_option(self) -> Option<T> {
        self.0
    }
}

impl<T> Default for Optional<T> {
    fn default() -> Self {
        Optional(None)
    }
}

impl<T> From<Option<T>> for Optional<T> {
    fn from(value: Option<T>) -> Self {
        Optional(value)
    }
}

impl<T> From<Optional<T>> for Option<T> {
    fn from(value: Optional<T>) -> Self {
        value.0
    }
}
