pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page parameters exactly as the caller supplied them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub number: Option<i64>,
    pub size: Option<i64>,
}

impl PageRequest {
    pub fn new(number: Option<i64>, size: Option<i64>) -> Self {
        Self { number, size }
    }

    /// Clamp into a usable page regardless of what was validated upstream.
    pub fn clamp(self) -> Pagination {
        let number = self.number.unwrap_or(1).max(1);
        let size = match self.size.unwrap_or(DEFAULT_PAGE_SIZE) {
            s if s < 1 => DEFAULT_PAGE_SIZE,
            s => s.min(MAX_PAGE_SIZE),
        };
        Pagination { number, size }
    }
}

/// A page that is always within bounds: `number >= 1`, `size` in `[1, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    number: i64,
    size: i64,
}

impl Pagination {
    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }

    /// Slice an already ordered, fully materialised list.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let size = usize::try_from(self.size).unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(size).collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        PageRequest::default().clamp()
    }
}

#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: Pagination,
}

impl<T> Paged<T> {
    pub fn total_pages(&self) -> i64 {
        (self.total + self.page.size - 1) / self.page.size
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
        }
    }
}
