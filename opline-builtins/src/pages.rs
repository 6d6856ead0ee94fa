//! Fixed-size pagination of text lines.

use std::fmt;

use thiserror::Error;

/// One page of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub lines: Vec<String>,
    /// 1-based page number
    pub number: usize,
    pub total: usize,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        write!(f, "Page {}/{}", self.number, self.total)
    }
}

/// Error type for pagination
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Page size must be at least 1")]
    ZeroPageSize,

    #[error("Page {page} is out of range (1-{total})")]
    OutOfRange { page: usize, total: usize },
}

/// Page `page` (1-based) of `items`, `page_size` lines per page.
///
/// An empty input still has one, empty, page.
///
/// ```
/// use opline_builtins::paginate;
///
/// let items = ["a", "b", "c"];
/// let page = paginate(&items, 2, 2).unwrap();
/// assert_eq!(page.to_string(), "c\nPage 2/2");
/// ```
pub fn paginate<S: AsRef<str>>(items: &[S], page_size: usize, page: usize) -> Result<Page, PageError> {
    if page_size == 0 {
        return Err(PageError::ZeroPageSize);
    }

    let total = items.len().div_ceil(page_size).max(1);
    if page == 0 || page > total {
        return Err(PageError::OutOfRange { page, total });
    }

    let lines = items
        .iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(|item| item.as_ref().to_string())
        .collect();

    Ok(Page {
        lines,
        number: page,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("line {}", i)).collect()
    }

    #[test]
    fn test_exact_multiple() {
        let all = items(4);
        let page = paginate(&all, 2, 2).unwrap();
        assert_eq!(page.lines, ["line 3", "line 4"]);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_partial_last_page() {
        let all = items(5);
        let page = paginate(&all, 2, 3).unwrap();
        assert_eq!(page.lines, ["line 5"]);
        assert_eq!(page.to_string(), "line 5\nPage 3/3");
    }

    #[test]
    fn test_empty_has_one_page() {
        let none: Vec<String> = Vec::new();
        let page = paginate(&none, 10, 1).unwrap();
        assert!(page.lines.is_empty());
        assert_eq!(page.to_string(), "Page 1/1");
    }

    #[test]
    fn test_out_of_range() {
        let all = items(3);
        assert_eq!(
            paginate(&all, 10, 2),
            Err(PageError::OutOfRange { page: 2, total: 1 })
        );
        assert_eq!(
            paginate(&all, 10, 0),
            Err(PageError::OutOfRange { page: 0, total: 1 })
        );
    }

    #[test]
    fn test_zero_page_size() {
        assert_eq!(paginate(&items(1), 0, 1), Err(PageError::ZeroPageSize));
    }
}
