use super::error::FilterError;
use super::types::{Pagination, Param, QueryParams};
use crate::config::PaginationConfig;

impl Pagination {
    /// Resolves `limit` and `skip` (alias `offset`) from the query string.
    ///
    /// Random-sample mode is chosen only when the config enables it and none
    /// of the three keys was sent; a key sent with an empty value counts as
    /// present and resolves to its default.
    pub fn resolve(params: &QueryParams, config: &PaginationConfig) -> Result<Self, FilterError> {
        let limit = int_param(params, "limit")?;
        let skip = int_param(params, "skip")?;
        let offset = int_param(params, "offset")?;

        if config.sample_when_unpaged && limit.is_absent() && skip.is_absent() && offset.is_absent() {
            return Ok(Pagination::Sample { size: config.sample_size });
        }

        let limit = limit.value_or(config.default_limit);
        if limit <= 0 {
            return Err(FilterError::InvalidLimit("Limit must be greater than 0.".to_string()));
        }

        let skip = skip.or_if_absent(offset).value_or(0);
        if skip < 0 {
            return Err(FilterError::InvalidOffset("Skip cannot be negative.".to_string()));
        }

        let limit = match config.max_limit {
            Some(max) if limit > max => {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max);
                max
            }
            _ => limit,
        };

        Ok(Pagination::Page { limit, skip })
    }

    /// Single-record page used for fetch-by-id
    pub fn single() -> Self {
        Pagination::Page { limit: 1, skip: 0 }
    }
}

fn int_param(params: &QueryParams, key: &str) -> Result<Param<i64>, FilterError> {
    match params.get(key).map(|v| v.trim()) {
        None => Ok(Param::Absent),
        Some("") => Ok(Param::Empty),
        Some(raw) => raw
            .parse::<i64>()
            .map(Param::Value)
            .map_err(|_| FilterError::InvalidInteger { key: key.to_string() }),
    }
}
