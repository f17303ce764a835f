use rand::seq::IndexedRandom;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::{CharacterFilter, FilterWhere};
use super::types::{Pagination, QueryParams, Sort, SortField, SqlResult};
use crate::config::PaginationConfig;
use crate::types::Character;

const CHARACTER_COLUMNS: &str = "c.\"id\", c.\"name\", c.\"house_id\", c.\"animal\", c.\"symbol\", \
     c.\"nickname\", c.\"role\", c.\"age\", c.\"death\", c.\"strength_id\"";

/// A fully resolved list request: predicates, ordering and page bounds.
///
/// The same value drives both stores, either rendered to SQL
/// (`to_sql` / `to_count_sql`) or executed over an in-memory list (`apply`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub conditions: CharacterFilter,
    pub sort: Sort,
    pub pagination: Pagination,
}

/// Result of running a `Filter` over an in-memory list
#[derive(Debug, Clone)]
pub struct Applied {
    pub characters: Vec<Character>,
    pub total: usize,
}

impl Filter {
    pub fn from_params(params: &QueryParams, config: &PaginationConfig) -> Result<Self, FilterError> {
        Ok(Self {
            conditions: CharacterFilter::from_params(params)?,
            sort: FilterOrder::resolve(params),
            pagination: Pagination::resolve(params, config)?,
        })
    }

    pub fn by_id(id: i32) -> Self {
        Self {
            conditions: CharacterFilter::by_id(id),
            sort: Sort::default(),
            pagination: Pagination::single(),
        }
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.conditions);
        let (order_clause, limit_clause) = match self.pagination {
            Pagination::Page { limit, skip } => {
                (FilterOrder::generate(&self.sort), format!("LIMIT {} OFFSET {}", limit, skip))
            }
            Pagination::Sample { size } => ("ORDER BY random()".to_string(), format!("LIMIT {}", size)),
        };

        let query = [
            format!("SELECT {}", CHARACTER_COLUMNS),
            "FROM \"characters\" c".to_string(),
            self.join_clause(true),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    /// Count of every row matching the predicates, ignoring pagination
    pub fn to_count_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.conditions);
        let query = [
            "SELECT COUNT(*) AS count FROM \"characters\" c".to_string(),
            self.join_clause(false),
            format!("WHERE {}", where_clause),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    /// Executes the filter over a full in-memory catalog
    pub fn apply(&self, characters: Vec<Character>) -> Applied {
        let mut matching: Vec<Character> = characters.into_iter().filter(|c| self.conditions.matches(c)).collect();
        let total = matching.len();

        let characters = match self.pagination {
            Pagination::Page { limit, skip } => {
                matching.sort_by(|a, b| FilterOrder::compare(&self.sort, a, b));
                matching
                    .into_iter()
                    .skip(usize::try_from(skip).unwrap_or(usize::MAX))
                    .take(usize::try_from(limit).unwrap_or(usize::MAX))
                    .collect()
            }
            Pagination::Sample { size } => {
                let size = usize::try_from(size).unwrap_or(0);
                matching.choose_multiple(&mut rand::rng(), size).cloned().collect()
            }
        };

        Applied { characters, total }
    }

    /// Joins are only added when a predicate (or, for the page query, the sort) needs them
    fn join_clause(&self, include_sort: bool) -> String {
        let sorting = match self.pagination {
            Pagination::Page { .. } if include_sort => Some(self.sort.field),
            _ => None,
        };

        let mut joins = vec![];
        if self.conditions.needs_house_join() || sorting == Some(SortField::House) {
            joins.push("LEFT JOIN \"houses\" h ON h.\"id\" = c.\"house_id\"");
        }
        if self.conditions.needs_strength_join() || sorting == Some(SortField::Strength) {
            joins.push("LEFT JOIN \"strengths\" s ON s.\"id\" = c.\"strength_id\"");
        }
        joins.join(" ")
    }
}
