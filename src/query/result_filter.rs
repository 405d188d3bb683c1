use std::fmt;
use serde_json::Value;

/// Check run against one decrypted candidate record
pub type RecordPredicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// Client-side re-check of decrypted results.
///
/// Bloom-filter indexes can admit records whose filter happens to cover the
/// query bits without containing the query terms. Each filter-match
/// constraint registers a predicate here; a record is kept only if every
/// predicate accepts it.
#[derive(Default)]
pub struct ResultFilter {
    predicates: Vec<RecordPredicate>,
}

impl ResultFilter {
    pub fn new() -> Self {
        ResultFilter {
            predicates: Vec::new(),
        }
    }

    pub fn add(&mut self, predicate: RecordPredicate) {
        self.predicates.push(predicate);
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn accepts(&self, record: &Value) -> bool {
        self.predicates.iter().all(|p| p(record))
    }

    /// Drop records failing any predicate, keeping the server's order
    pub fn apply(&self, records: Vec<Value>) -> Vec<Value> {
        if self.predicates.is_empty() {
            return records;
        }
        records.into_iter().filter(|r| self.accepts(r)).collect()
    }
}

impl fmt::Debug for ResultFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultFilter")
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = ResultFilter::new();
        let records = vec![json!({"a": 1}), json!({"a": 2})];
        assert_eq!(filter.apply(records.clone()), records);
    }

    #[test]
    fn predicates_are_conjoined() {
        let mut filter = ResultFilter::new();
        filter.add(Box::new(|r| r["a"].as_i64().unwrap_or(0) > 1));
        filter.add(Box::new(|r| r["b"] == json!(true)));

        let kept = filter.apply(vec![
            json!({"a": 1, "b": true}),
            json!({"a": 2, "b": false}),
            json!({"a": 3, "b": true}),
        ]);
        assert_eq!(kept, vec![json!({"a": 3, "b": true})]);
    }
}
