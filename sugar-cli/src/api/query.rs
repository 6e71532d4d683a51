//! Entry list query parameters
//!
//! Fluent builder for the filter/paging arguments of `get_entry_list`.

/// Default page size when none is given
pub const DEFAULT_MAX_RESULTS: i32 = 20;

/// Filter, ordering and paging for an entry list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// SQL `WHERE` fragment evaluated by the server (e.g., "accounts.name like 'A%'")
    pub query: String,
    /// SQL `ORDER BY` fragment
    pub order_by: String,
    pub offset: i32,
    pub max_results: i32,
    /// Include soft-deleted records
    pub deleted: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            order_by: String::new(),
            offset: 0,
            max_results: DEFAULT_MAX_RESULTS,
            deleted: false,
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }

    pub fn offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }

    pub fn max_results(mut self, max_results: i32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }

    /// The `deleted` flag as the integer the wire format expects
    pub fn deleted_flag(&self) -> i32 {
        i32::from(self.deleted)
    }
}
