//! Offset pagination with a fixed page size.

use serde::{Deserialize, Serialize};

/// A 1-based page number and the number of items per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page:     u32,
  pub per_page: u32,
}

impl PageRequest {
  /// Missing or zero page numbers fall back to the first page.
  pub fn new(page: Option<u32>, per_page: u32) -> Self {
    Self {
      page:     page.filter(|p| *p > 0).unwrap_or(1),
      per_page: per_page.max(1),
    }
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.per_page)
  }

  pub fn limit(&self) -> u64 { u64::from(self.per_page) }
}

/// One page of a collection together with the size of the whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub total: u64,
}

impl<T> Page<T> {
  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      items: self.items.into_iter().map(f).collect(),
      total: self.total,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_zero_and_missing_default_to_first() {
    assert_eq!(PageRequest::new(None, 2).page, 1);
    assert_eq!(PageRequest::new(Some(0), 2).page, 1);
  }

  #[test]
  fn offsets_follow_page_size() {
    assert_eq!(PageRequest::new(Some(1), 2).offset(), 0);
    assert_eq!(PageRequest::new(Some(3), 2).offset(), 4);
    assert_eq!(PageRequest::new(Some(3), 2).limit(), 2);
  }

  #[test]
  fn zero_page_size_is_clamped() {
    assert_eq!(PageRequest::new(Some(1), 0).per_page, 1);
  }
}
