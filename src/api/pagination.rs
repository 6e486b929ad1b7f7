use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) page: i64,
    pub(crate) page_size: i64,
    pub(crate) total_pages: i64,
}

/// One page of a listing. Pages are 1-based; a missing or unparsable page is the first one and
/// a page past the end is the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageWindow {
    pub(crate) page: i64,
    pub(crate) page_size: i64,
    pub(crate) total_pages: i64,
}

impl PageWindow {
    pub(crate) fn resolve(requested: Option<&str>, total_count: i64, page_size: i64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = ((total_count.max(0) + page_size - 1) / page_size).max(1);
        let page = requested
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
            .min(total_pages);

        Self { page, page_size, total_pages }
    }

    pub(crate) fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    pub(crate) fn wrap<T>(&self, items: Vec<T>, total_count: i64) -> PaginatedResponse<T> {
        PaginatedResponse {
            items,
            total_count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}
