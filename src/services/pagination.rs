use serde::Serialize;

/// A 1-based page request, already clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// `page` is raised to at least 1; `page_size` is clamped to
    /// `1..=max_page_size`.
    pub fn clamped(page: i64, page_size: i64, max_page_size: u32) -> Self {
        let max = i64::from(max_page_size.max(1));
        Self {
            page: page.clamp(1, i64::from(u32::MAX)) as u32,
            page_size: page_size.clamp(1, max) as u32,
        }
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}

/// Slice an already sorted collection.
pub fn paginate<T>(all: Vec<T>, request: PageRequest) -> Page<T> {
    let total = all.len();
    let items = all
        .into_iter()
        .skip(request.offset())
        .take(request.page_size as usize)
        .collect();

    Page {
        items,
        total,
        page: request.page,
        page_size: request.page_size,
    }
}
