use serde_json::Value;
use tracing::debug;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::operator::Operator;
use crate::index::Index;
use crate::query::ast::Statement;
use crate::query::parser::QueryParser;
use crate::query::result_filter::ResultFilter;
use crate::query::types::{OrderingDirective, PreparedQuery, QueryRequest, SortOrder};
use crate::index::vector::Constraint;

/// Collects constraints, ordering and paging for one query against a set of
/// loaded indexes.
#[derive(Debug)]
pub struct QueryBuilder<'c> {
    indexes: &'c [Index],
    constraints: Vec<Constraint>,
    ordering: Vec<OrderingDirective>,
    limit: u32,
    offset: u32,
    result_filter: ResultFilter,
}

impl<'c> QueryBuilder<'c> {
    pub fn new(indexes: &'c [Index], config: &Config) -> Self {
        QueryBuilder {
            indexes,
            constraints: Vec::new(),
            ordering: Vec::new(),
            limit: config.default_limit,
            offset: config.default_offset,
            result_filter: ResultFilter::new(),
        }
    }

    fn find(&self, name: &str) -> Option<&'c Index> {
        let indexes: &'c [Index] = self.indexes;
        indexes.iter().find(|idx| idx.name() == name)
    }

    /// `index_name.op(args...)`, with the operator given by name
    pub fn constrain(&mut self, index_name: &str, op: &str, args: &[Value]) -> Result<&mut Self> {
        let op: Operator = op
            .parse()
            .map_err(|e: Error| Error::new(ErrorKind::QueryConstraint, e.context))?;
        self.constrain_op(index_name, op, args)
    }

    pub fn constrain_op(
        &mut self,
        index_name: &str,
        op: Operator,
        args: &[Value],
    ) -> Result<&mut Self> {
        let index = self.searchable_index(index_name)?;

        if !index.supports(op) {
            return Err(Error::new(
                ErrorKind::QueryConstraint,
                format!("Unknown operator '{}' for index '{}'", op, index_name),
            ));
        }

        let constraints = index.generate_constraints(op, args).map_err(|e| match e.kind {
            ErrorKind::UnsupportedOperator => Error::new(ErrorKind::QueryConstraint, e.context),
            _ => e,
        })?;

        if let Some(predicate) = index.result_predicate(op, args)? {
            self.result_filter.add(predicate);
        }

        debug!(index = %index_name, op = %op, constraints = constraints.len(), "constrained query");
        self.constraints.extend(constraints);
        Ok(self)
    }

    pub fn order_by(&mut self, index_name: &str, direction: &str) -> Result<&mut Self> {
        let direction: SortOrder = direction.parse()?;
        self.order_by_direction(index_name, direction)
    }

    pub fn order_by_direction(
        &mut self,
        index_name: &str,
        direction: SortOrder,
    ) -> Result<&mut Self> {
        let index = self.find(index_name).ok_or_else(|| {
            Error::new(
                ErrorKind::QueryOrdering,
                format!("Undefined index '{}' in order_by", index_name),
            )
        })?;

        if !index.orderable() {
            return Err(Error::new(
                ErrorKind::QueryOrdering,
                format!(
                    "Index '{}' of kind \"{}\" cannot be used for ordering",
                    index_name,
                    index.kind_name()
                ),
            ));
        }

        if !index.searchable() {
            return Err(Error::new(
                ErrorKind::QueryOrdering,
                format!("Index '{}' is not searchable yet", index_name),
            ));
        }

        self.ordering.push(OrderingDirective {
            index_id: index.id(),
            direction,
        });
        Ok(self)
    }

    pub fn limit(&mut self, limit: u32) -> &mut Self {
        self.limit = limit;
        self
    }

    pub fn offset(&mut self, offset: u32) -> &mut Self {
        self.offset = offset;
        self
    }

    /// Typed access to one index: `builder.on("year")?.gt(2015)?`
    pub fn on<'b>(&'b mut self, index_name: &str) -> Result<IndexSelector<'b, 'c>> {
        self.searchable_index(index_name)?;
        Ok(IndexSelector {
            builder: self,
            index_name: index_name.to_string(),
        })
    }

    /// Apply parsed statements in order
    pub fn apply(&mut self, statements: &[Statement]) -> Result<&mut Self> {
        for statement in statements {
            match statement {
                Statement::Constrain { index, op, args } => {
                    self.constrain(index, op, args)?;
                }
                Statement::OrderBy { index, direction } => {
                    self.order_by(index, direction)?;
                }
                Statement::Limit(n) => {
                    self.limit(*n);
                }
                Statement::Offset(n) => {
                    self.offset(*n);
                }
            }
        }
        Ok(self)
    }

    /// Parse and apply the textual query language
    pub fn parse(&mut self, query: &str) -> Result<&mut Self> {
        let statements = QueryParser::new().parse(query)?;
        self.apply(&statements)
    }

    pub fn build(self) -> PreparedQuery {
        PreparedQuery {
            request: QueryRequest {
                constraints: self.constraints,
                ordering: self.ordering,
                limit: self.limit,
                offset: self.offset,
            },
            result_filter: self.result_filter,
        }
    }

    fn searchable_index(&self, index_name: &str) -> Result<&'c Index> {
        let index = self.find(index_name).ok_or_else(|| {
            Error::new(ErrorKind::QueryConstraint, format!("Undefined index '{}'", index_name))
        })?;

        if !index.searchable() {
            return Err(Error::new(
                ErrorKind::QueryConstraint,
                format!("Index '{}' is not searchable yet", index_name),
            ));
        }

        Ok(index)
    }
}

/// Operator methods bound to one index name
pub struct IndexSelector<'b, 'c> {
    builder: &'b mut QueryBuilder<'c>,
    index_name: String,
}

impl<'b, 'c> IndexSelector<'b, 'c> {
    fn apply(self, op: Operator, args: &[Value]) -> Result<&'b mut QueryBuilder<'c>> {
        self.builder.constrain_op(&self.index_name, op, args)?;
        Ok(self.builder)
    }

    pub fn eq(self, value: impl Into<Value>) -> Result<&'b mut QueryBuilder<'c>> {
        self.apply(Operator::Eq, &[value.into()])
    }

    pub fn lt(self, value: impl Into<Value>) -> Result<&'b mut QueryBuilder<'c>> {
        self.apply(Operator::Lt, &[value.into()])
    }

    pub fn lte(self, value: impl Into<Value>) -> Result<&'b mut QueryBuilder<'c>> {
        self.apply(Operator::Lte, &[value.into()])
    }

    pub fn gt(self, value: impl Into<Value>) -> Result<&'b mut QueryBuilder<'c>> {
        self.apply(Operator::Gt, &[value.into()])
    }

    pub fn gte(self, value: impl Into<Value>) -> Result<&'b mut QueryBuilder<'c>> {
        self.apply(Operator::Gte, &[value.into()])
    }

    pub fn between(
        self,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Result<&'b mut QueryBuilder<'c>> {
        self.apply(Operator::Between, &[min.into(), max.into()])
    }

    pub fn matches(self, text: &str) -> Result<&'b mut QueryBuilder<'c>> {
        self.apply(Operator::Match, &[Value::from(text)])
    }

    /// `match` on a field-dynamic index
    pub fn field_matches(self, field: &str, text: &str) -> Result<&'b mut QueryBuilder<'c>> {
        self.apply(Operator::Match, &[Value::from(field), Value::from(text)])
    }

    /// `eq` on a field-dynamic-exact index
    pub fn field_eq(self, field: &str, value: &str) -> Result<&'b mut QueryBuilder<'c>> {
        self.apply(Operator::Eq, &[Value::from(field), Value::from(value)])
    }
}
