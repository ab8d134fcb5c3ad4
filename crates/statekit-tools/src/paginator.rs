use statekit_core::{CancelToken, Signal, signal};

/// One page worth of list state. `page` is 1-indexed and always clamped to
/// `[1, pages_count]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageData {
    pub page: u64,
    pub page_size: u64,
    pub pages_count: u64,
}

impl Default for PageData {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            pages_count: 1,
        }
    }
}

/// The offset/limit shape most list endpoints speak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffsetData {
    pub offset: u64,
    pub limit: u64,
    pub count: u64,
}

impl From<OffsetData> for PageData {
    fn from(d: OffsetData) -> Self {
        if d.limit == 0 {
            return PageData::default();
        }
        Self {
            page: d.offset / d.limit + 1,
            page_size: d.limit,
            pages_count: d.count.div_ceil(d.limit).max(1),
        }
    }
}

impl From<PageData> for OffsetData {
    fn from(d: PageData) -> Self {
        Self {
            offset: d.page.saturating_sub(1) * d.page_size,
            limit: d.page_size,
            count: d.pages_count * d.page_size,
        }
    }
}

#[derive(Default)]
pub struct PaginatorConfig {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub pages_count: Option<u64>,
    pub page_sizes: Vec<u64>,
    pub cancel: Option<CancelToken>,
}

/// Paginated list state with clamped navigation.
pub struct Paginator {
    data: Signal<PageData>,
    page_sizes: Signal<Vec<u64>>,
    token: CancelToken,
}

impl Paginator {
    pub fn new(config: PaginatorConfig) -> Self {
        let page_size = config
            .page_size
            .or_else(|| config.page_sizes.first().copied())
            .unwrap_or(10);
        let pages_count = config.pages_count.unwrap_or(1).max(1);
        let page = config.page.unwrap_or(1).clamp(1, pages_count);

        Self {
            data: signal(PageData {
                page,
                page_size,
                pages_count,
            }),
            page_sizes: signal(config.page_sizes),
            token: CancelToken::linked(config.cancel.as_ref()),
        }
    }

    pub fn data(&self) -> PageData {
        self.data.get()
    }

    /// The underlying signal, for subscribers.
    pub fn signal(&self) -> &Signal<PageData> {
        &self.data
    }

    pub fn page_sizes(&self) -> Vec<u64> {
        self.page_sizes.get()
    }

    pub fn to_page(&self, page: u64) {
        // pages_count can arrive as 0 through signal() or sync_with; treat
        // that as a single page rather than let clamp assert.
        self.data
            .update(|d| d.page = page.clamp(1, d.pages_count.max(1)));
    }

    pub fn to_next_page(&self) {
        self.to_page(self.data().page + 1);
    }

    pub fn to_previous_page(&self) {
        self.to_page(self.data().page.saturating_sub(1));
    }

    /// Changing the page size sends the caller back to the first page.
    pub fn set_page_size(&self, page_size: u64) {
        self.data.update(|d| {
            d.page_size = page_size;
            d.page = 1;
        });
    }

    pub fn set_pages_count(&self, pages_count: u64) {
        self.data.update(|d| {
            d.pages_count = pages_count.max(1);
            d.page = d.page.clamp(1, d.pages_count);
        });
    }

    pub fn set_page_sizes(&self, page_sizes: Vec<u64>) {
        self.page_sizes.set(page_sizes);
    }

    pub fn reset(&self) {
        self.to_page(1);
    }

    pub fn to_offset_data(&self) -> OffsetData {
        self.data().into()
    }

    /// Applies `source` now and follows its future changes until the
    /// paginator's token cancels.
    pub fn sync_with(&self, source: &Signal<PageData>) {
        self.data.set(source.get());
        let data = self.data.clone();
        source.subscribe_until(&self.token, move |d| data.set(*d));
    }

    pub fn destroy(&self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginator(page: u64, page_size: u64, pages_count: u64) -> Paginator {
        Paginator::new(PaginatorConfig {
            page: Some(page),
            page_size: Some(page_size),
            pages_count: Some(pages_count),
            page_sizes: vec![10, 25, 50],
            cancel: None,
        })
    }

    #[test]
    fn initializes_with_defaults() {
        let p = Paginator::new(PaginatorConfig {
            page_sizes: vec![10, 25, 50],
            ..Default::default()
        });
        assert_eq!(p.data(), PageData { page: 1, page_size: 10, pages_count: 1 });
    }

    #[test]
    fn navigation_clamps_to_bounds() {
        let p = paginator(1, 10, 5);

        p.to_next_page();
        assert_eq!(p.data().page, 2);

        p.to_previous_page();
        assert_eq!(p.data().page, 1);

        p.to_page(4);
        assert_eq!(p.data().page, 4);

        p.to_page(10);
        assert_eq!(p.data().page, 5);

        p.to_page(0);
        assert_eq!(p.data().page, 1);
    }

    #[test]
    fn set_page_size_resets_to_first_page() {
        let p = paginator(3, 10, 5);
        p.set_page_size(25);
        assert_eq!(p.data().page_size, 25);
        assert_eq!(p.data().page, 1);
    }

    #[test]
    fn shrinking_pages_count_reclamps_page() {
        let p = paginator(5, 10, 5);
        p.set_pages_count(3);
        assert_eq!(p.data().page, 3);
    }

    #[test]
    fn converts_between_offset_and_page_data() {
        let page: PageData = OffsetData { offset: 20, limit: 10, count: 100 }.into();
        assert_eq!(page, PageData { page: 3, page_size: 10, pages_count: 10 });

        let offset: OffsetData = page.into();
        assert_eq!(offset, OffsetData { offset: 20, limit: 10, count: 100 });
    }

    #[test]
    fn zero_limit_offset_data_degrades_to_defaults() {
        let page: PageData = OffsetData { offset: 0, limit: 0, count: 7 }.into();
        assert_eq!(page, PageData::default());
    }

    #[test]
    fn navigation_survives_host_fed_zero_pages_count() {
        let p = paginator(1, 10, 5);
        p.signal().set(PageData { page: 1, page_size: 10, pages_count: 0 });

        p.to_next_page();
        assert_eq!(p.data().page, 1);

        p.to_page(3);
        assert_eq!(p.data().page, 1);

        p.to_previous_page();
        assert_eq!(p.data().page, 1);
    }

    #[test]
    fn sync_with_follows_source_until_destroyed() {
        let p = paginator(1, 10, 5);
        let source = signal(PageData { page: 3, page_size: 25, pages_count: 10 });

        p.sync_with(&source);
        assert_eq!(p.data().page, 3);
        assert_eq!(p.data().page_size, 25);

        source.set(PageData { page: 4, page_size: 25, pages_count: 10 });
        assert_eq!(p.data().page, 4);

        p.destroy();
        source.set(PageData { page: 9, page_size: 25, pages_count: 10 });
        assert_eq!(p.data().page, 4);
    }
}
