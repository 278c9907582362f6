use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::errors::AppError;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;
/// Largest page whose offset still fits in an `i64`.
const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    /// Missing or non-positive values fall back to page 1 / limit 10.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page
                .filter(|p| *p > 0)
                .unwrap_or(DEFAULT_PAGE)
                .min(MAX_PAGE),
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_LIMIT)
                .min(MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    pub fn for_page(params: PageParams, total: i64) -> Self {
        let end = params.page.saturating_mul(params.limit);
        Self {
            next: (end < total).then_some(PageRef {
                page: params.page + 1,
                limit: params.limit,
            }),
            prev: (params.offset() > 0).then_some(PageRef {
                page: params.page - 1,
                limit: params.limit,
            }),
        }
    }
}

/// `{count, pagination, data}` list envelope. `count` is the page length.
#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T> Paged<T> {
    pub fn new(data: Vec<T>, params: PageParams, total: i64) -> Self {
        Self {
            count: data.len(),
            pagination: Pagination::for_page(params, total),
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD`. A bare end date covers
/// the whole day.
pub fn parse_date_param(field: &str, raw: &str, bound: DateBound) -> Result<DateTime<Utc>, AppError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("{field} must be a date (YYYY-MM-DD) or RFC 3339 timestamp"))
    })?;
    let time = match bound {
        DateBound::Start => NaiveTime::MIN,
        DateBound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN),
    };
    Ok(date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::new(None, None);
        assert_eq!(params, PageParams { page: 1, limit: 10 });
        assert_eq!(params.offset(), 0);
        assert_eq!(PageParams::new(Some(0), Some(-5)), params);
    }

    #[test]
    fn test_limit_is_capped() {
        assert_eq!(PageParams::new(Some(2), Some(10_000)).limit, MAX_LIMIT);
    }

    #[test]
    fn test_middle_page_links_both_ways() {
        let params = PageParams::new(Some(2), Some(10));
        let pagination = Pagination::for_page(params, 35);
        assert_eq!(pagination.next, Some(PageRef { page: 3, limit: 10 }));
        assert_eq!(pagination.prev, Some(PageRef { page: 1, limit: 10 }));
    }

    #[test]
    fn test_single_page_has_no_links() {
        let pagination = Pagination::for_page(PageParams::new(None, None), 4);
        assert_eq!(pagination, Pagination::default());
        let json = serde_json::to_value(&pagination).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_date_params() {
        let start = parse_date_param("start_date", "2026-03-01", DateBound::Start).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-03-01T00:00:00+00:00");
        let end = parse_date_param("end_date", "2026-03-01", DateBound::End).unwrap();
        assert_eq!(end.format("%H:%M:%S").to_string(), "23:59:59");
        let exact = parse_date_param("end_date", "2026-03-01T08:30:00Z", DateBound::End).unwrap();
        assert_eq!(exact.format("%H:%M").to_string(), "08:30");
        assert!(parse_date_param("start_date", "last week", DateBound::Start).is_err());
    }

    #[test]
    fn test_huge_page_is_clamped() {
        let params = PageParams::new(Some(i64::MAX), Some(MAX_LIMIT));
        assert_eq!(params.page, MAX_PAGE);
        assert!(params.offset() > 0);

        let pagination = Pagination::for_page(PageParams::new(Some(i64::MAX), Some(10)), 35);
        assert_eq!(pagination.next, None);
        assert!(pagination.prev.is_some());
    }

    #[test]
    fn test_last_page_has_only_prev() {
        let pagination = Pagination::for_page(PageParams::new(Some(4), Some(10)), 35);
        assert_eq!(pagination.next, None);
        assert!(pagination.prev.is_some());
    }
}
