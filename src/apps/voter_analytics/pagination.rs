use crate::error::{AppError, Result};

/// One page of a result set, numbered from 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total: usize,
}

impl Page {
    /// Resolves the `page` parameter. Missing means the first page and `last`
    /// the final one; anything else must be an in-range number.
    pub fn resolve(requested: Option<&str>, total: usize, per_page: usize) -> Result<Self> {
        let per_page = per_page.max(1);
        // An empty result still has one (empty) page.
        let num_pages = total.div_ceil(per_page).max(1);
        let number = match requested.map(str::trim).filter(|p| !p.is_empty()) {
            None => 1,
            Some("last") => num_pages,
            Some(raw) => raw.parse::<usize>().map_err(|_| AppError::NotFound("Page"))?,
        };
        if number == 0 || number > num_pages {
            return Err(AppError::NotFound("Page"));
        }
        Ok(Self {
            number,
            num_pages,
            per_page,
            total,
        })
    }

    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_number(&self) -> usize {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_number(&self) -> usize {
        (self.number + 1).min(self.num_pages)
    }

    /// 1-based index of the first item on this page.
    pub fn start_index(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.offset() + 1
        }
    }

    pub fn end_index(&self) -> usize {
        (self.offset() + self.per_page).min(self.total)
    }
}
