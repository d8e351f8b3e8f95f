use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Sort columns accepted for user listings.
pub const USER_SORT_COLUMNS: &[&str] = &[
    "id",
    "username",
    "address",
    "chain",
    "games_played",
    "game_won",
    "game_lost",
    "created_at",
    "updated_at",
];

/// Sort columns accepted for card listings.
pub const CARD_SORT_COLUMNS: &[&str] = &[
    "id",
    "instruction",
    "card_type",
    "amount",
    "created_at",
    "updated_at",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Common list-query parameters: page/limit plus optional sort and search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i32>,
    pub limit: Option<i32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
}

impl PaginationQuery {
    pub fn page(&self) -> i32 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> i32 {
        self.limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i32 {
        (self.page() - 1) * self.limit()
    }

    /// ILIKE pattern for the search term, None when absent or blank.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s))
    }

    /// Builds an ORDER BY clause from a column whitelist. An unknown or
    /// missing sort column falls back to the default; this is the only
    /// place user input reaches SQL text.
    pub fn order_clause(&self, allowed: &[&str], default: &str) -> String {
        let column = self
            .sort_by
            .as_deref()
            .filter(|c| allowed.contains(c))
            .unwrap_or(default);
        let order = self.sort_order.unwrap_or(SortOrder::Asc).as_sql();
        format!("ORDER BY {} {}", column, order)
    }
}

// ==================== PAGINATED ENVELOPE ====================
#[derive(Debug, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i32,
    pub limit: i32,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PageMeta {
    pub fn compute(page: i32, limit: i32, total_items: i64) -> Self {
        let total_pages = if limit > 0 {
            (total_items + limit as i64 - 1) / limit as i64
        } else {
            0
        };
        Self {
            page,
            limit,
            total_items,
            total_pages,
            has_next_page: (page as i64) < total_pages,
            has_previous_page: page > 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, query: &PaginationQuery, total_items: i64) -> Self {
        Self {
            meta: PageMeta::compute(query.page(), query.limit(), total_items),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_missing() {
        let query = PaginationQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn limit_is_capped_and_nonpositive_values_fall_back() {
        let query = PaginationQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(query.limit(), MAX_PAGE_SIZE);

        let query = PaginationQuery {
            page: Some(0),
            limit: Some(-5),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let query = PaginationQuery {
            page: Some(3),
            limit: Some(20),
            ..Default::default()
        };
        assert_eq!(query.offset(), 40);
    }

    #[test]
    fn order_clause_ignores_unknown_columns() {
        let query = PaginationQuery {
            sort_by: Some("username; DROP TABLE users".to_string()),
            sort_order: Some(SortOrder::Desc),
            ..Default::default()
        };
        assert_eq!(
            query.order_clause(USER_SORT_COLUMNS, "id"),
            "ORDER BY id DESC"
        );
    }

    #[test]
    fn order_clause_uses_whitelisted_column() {
        let query = PaginationQuery {
            sort_by: Some("username".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.order_clause(USER_SORT_COLUMNS, "id"),
            "ORDER BY username ASC"
        );
    }

    #[test]
    fn search_pattern_wraps_and_skips_blank() {
        let query = PaginationQuery {
            search: Some(" alice ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.search_pattern().as_deref(), Some("%alice%"));

        let query = PaginationQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(query.search_pattern().is_none());
    }

    #[test]
    fn page_meta_marks_boundaries() {
        let meta = PageMeta::compute(1, 10, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);
        assert!(!meta.has_previous_page);

        let meta = PageMeta::compute(3, 10, 25);
        assert!(!meta.has_next_page);
        assert!(meta.has_previous_page);
    }

    #[test]
    fn page_meta_handles_empty_result_set() {
        let meta = PageMeta::compute(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_previous_page);
    }
}
