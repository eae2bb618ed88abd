use serde::{Deserialize, Serialize};

pub const PAGINATION_HEADER: &str = "x-pagination";

/// Paging metadata returned in the `X-Pagination` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Pagination {
    pub page_number: i64,
    pub page_size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_pascal_case_keys() {
        let header = serde_json::to_string(&Pagination { page_number: 2, page_size: 5 }).unwrap();
        assert_eq!(header, r#"{"PageNumber":2,"PageSize":5}"#);
    }
}
