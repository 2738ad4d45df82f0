/// Offset/limit window over an ordered listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u32,
}

/// Per-listing paging policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageBounds {
    pub default_limit: u32,
    pub max_limit: u32,
}

pub const USER_PAGE: PageBounds = PageBounds {
    default_limit: 100,
    max_limit: 500,
};

pub const GROUP_PAGE: PageBounds = PageBounds {
    default_limit: 100,
    max_limit: 500,
};

pub const MEMBER_PAGE: PageBounds = PageBounds {
    default_limit: 200,
    max_limit: 1000,
};

pub const USER_GROUP_PAGE: PageBounds = PageBounds {
    default_limit: 100,
    max_limit: 500,
};

impl Page {
    pub fn new(offset: u64, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// First page of a listing at its default size.
    pub fn first(bounds: PageBounds) -> Self {
        Self::new(0, bounds.default_limit)
    }

    pub fn clamp_to(self, bounds: PageBounds) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit.min(bounds.max_limit),
        }
    }

    pub(crate) fn sql_limit(&self) -> i64 {
        i64::from(self.limit)
    }

    pub(crate) fn sql_offset(&self) -> i64 {
        i64::try_from(self.offset).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_caps_limit_and_keeps_offset() {
        let page = Page::new(7, 5_000).clamp_to(USER_PAGE);
        assert_eq!(page, Page::new(7, 500));

        let page = Page::new(0, 5_000).clamp_to(MEMBER_PAGE);
        assert_eq!(page.limit, 1000);
    }

    #[test]
    fn clamp_leaves_small_limits_alone() {
        let page = Page::new(3, 20).clamp_to(GROUP_PAGE);
        assert_eq!(page, Page::new(3, 20));
    }

    #[test]
    fn first_page_uses_default_limit() {
        assert_eq!(Page::first(MEMBER_PAGE), Page::new(0, 200));
        assert_eq!(Page::first(USER_GROUP_PAGE), Page::new(0, 100));
    }

    #[test]
    fn sql_offset_saturates() {
        let page = Page::new(u64::MAX, 1);
        assert_eq!(page.sql_offset(), i64::MAX);
    }
}
