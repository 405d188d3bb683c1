use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One statement of the textual query language.
///
/// ```text
/// title.match("star trek"); year.gt(2015); order_by(year, desc); limit(10)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `index.op(arg, ...)`
    Constrain {
        index: String,
        op: String,
        args: Vec<Value>,
    },
    /// `order_by(index, asc|desc)`
    OrderBy { index: String, direction: String },
    Limit(u32),
    Offset(u32),
}
