use std::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::vector::Constraint;
use crate::query::result_filter::ResultFilter;

/// Sort order for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,   // Ascending: 0 → 9, A → Z
    Desc,  // Descending: 9 → 0, Z → A
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(Error::new(
                ErrorKind::QueryOrdering,
                format!("Invalid ordering direction {:?}; expected asc or desc", s),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderingDirective {
    pub index_id: Uuid,
    pub direction: SortOrder,
}

/// Everything the transport layer needs to build the wire query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// AND-combined. Alternatives from one `match` call live inside a
    /// single `anyOf` constraint.
    pub constraints: Vec<Constraint>,
    /// Applied in order
    pub ordering: Vec<OrderingDirective>,
    pub limit: u32,
    pub offset: u32,
}

/// A built query: the encrypted request plus the client-side re-check the
/// caller must run over decrypted results.
#[derive(Debug)]
pub struct PreparedQuery {
    pub request: QueryRequest,
    pub result_filter: ResultFilter,
}

impl PreparedQuery {
    pub fn filter_results(&self, records: Vec<Value>) -> Vec<Value> {
        self.result_filter.apply(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_parse_case_insensitively() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("descending".parse::<SortOrder>().unwrap(), SortOrder::Desc);

        let err = "sideways".parse::<SortOrder>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryOrdering);
    }
}
