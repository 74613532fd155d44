use crate::db::{Database, SummaryStore};
use crate::errors::{AppError, AppResult};
use crate::models::{SearchResult, SearchResultItem, SearchUserParam, SummaryQuery};
use std::sync::Arc;

/// Turns a filter plus a one-indexed page window into a summary query and wraps the returned
/// page with navigation markers.
#[derive(Clone)]
pub struct SearchAssembler {
    db: Arc<Database>,
}

impl SearchAssembler {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn search_users(&self, operator: &str, param: &SearchUserParam) -> AppResult<SearchResult> {
        let query = build_query(param)?;
        let rows = self.db.read_transaction(|tx| SummaryStore::new(tx).search(&query))?;
        let returned = rows.len();
        let (prev_page_no, next_page_no) = page_markers(param.page_no, param.page_size, returned);

        tracing::debug!(
            operator,
            page_no = param.page_no,
            page_size = param.page_size,
            returned,
            "user search"
        );

        Ok(SearchResult {
            items: rows.into_iter().map(SearchResultItem::from).collect(),
            prev_page_no,
            next_page_no,
            page_size: param.page_size,
        })
    }
}

pub fn build_query(param: &SearchUserParam) -> AppResult<SummaryQuery> {
    if param.page_no == 0 {
        return Err(AppError::InvalidInput("pageNo starts at 1".to_string()));
    }
    if param.page_size == 0 {
        return Err(AppError::InvalidInput("pageSize must be at least 1".to_string()));
    }
    Ok(SummaryQuery {
        name: non_blank(param.name.as_deref()),
        dept_id: non_blank(param.dept_id.as_deref()),
        begin_date: param.begin_date,
        end_date: param.end_date,
        limit: param.page_size,
        offset: u64::from(param.page_no - 1) * u64::from(param.page_size),
    })
}

/// Previous page exists past page one. A next page is advertised whenever the current page
/// came back full; no total count is consulted, so an exactly-full last page still points at
/// an empty successor.
pub fn page_markers(page_no: u32, page_size: u32, returned: usize) -> (Option<u32>, Option<u32>) {
    let prev = (page_no > 1).then(|| page_no - 1);
    let next = (returned == page_size as usize).then(|| page_no.saturating_add(1));
    (prev, next)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::{build_query, page_markers};
    use crate::models::SearchUserParam;

    #[test]
    fn markers_follow_the_full_page_heuristic() {
        assert_eq!(page_markers(1, 2, 2), (None, Some(2)));
        assert_eq!(page_markers(2, 2, 2), (Some(1), Some(3)));
        assert_eq!(page_markers(3, 2, 1), (Some(2), None));
        assert_eq!(page_markers(4, 2, 0), (Some(3), None));
    }

    #[test]
    fn query_offsets_from_one_indexed_pages() {
        let query = build_query(&SearchUserParam {
            name: Some("  ".to_string()),
            dept_id: Some("01".to_string()),
            page_no: 3,
            page_size: 20,
            ..SearchUserParam::default()
        })
        .expect("query");
        assert_eq!(query.offset, 40);
        assert_eq!(query.limit, 20);
        assert!(query.name.is_none());
        assert_eq!(query.dept_id.as_deref(), Some("01"));
    }

    #[test]
    fn zero_page_inputs_are_rejected() {
        assert!(build_query(&SearchUserParam {
            page_no: 0,
            page_size: 10,
            ..SearchUserParam::default()
        })
        .is_err());
        assert!(build_query(&SearchUserParam {
            page_no: 1,
            page_size: 0,
            ..SearchUserParam::default()
        })
        .is_err());
    }
}
