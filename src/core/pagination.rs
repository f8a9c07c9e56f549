pub const QUESTIONS_PER_PAGE: usize = 10;

/// 1-based page window over an ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub per_page: usize,
}

impl Page {
    /// Returns None for page numbers below 1 or a zero page size.
    pub fn new(number: i64, per_page: usize) -> Option<Self> {
        if number < 1 || per_page == 0 {
            return None;
        }
        Some(Self {
            number: number as usize,
            per_page,
        })
    }

    pub fn start(&self) -> usize {
        (self.number - 1).saturating_mul(self.per_page)
    }

    pub fn end(&self) -> usize {
        self.start().saturating_add(self.per_page)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.start().min(items.len());
        let end = self.end().min(items.len());
        &items[start..end]
    }
}
