use crate::consistency::ConsistencyLevel;
use crate::errors::CqlError;
use crate::value::CqlValue;

/// Sort direction for order-by and clustering columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_cql(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Predicate operators. Predicates combine by implicit conjunction only;
/// the dialect has no OR or grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Contains,
    ContainsKey,
}

impl PredicateOp {
    pub fn as_cql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::In => "in",
            Self::Contains => "contains",
            Self::ContainsKey => "contains key",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: PredicateOp,
    pub value: CqlValue,
}

/// The three collection column kinds of the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Set,
    List,
    Map,
}

/// In-place collection operation for update mutations,
/// e.g. `tags = tags + {'new'}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOp {
    Add,
    Subtract,
}

impl CollectionOp {
    pub fn as_cql(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionMutation {
    pub column: String,
    pub kind: CollectionKind,
    pub operation: Option<CollectionOp>,
    pub value: CqlValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    Min,
    Max,
    Sum,
    Avg,
}

impl AggregateFn {
    pub fn as_cql(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
            Self::Avg => "avg",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: AggregateFn,
    pub column: String,
}

/// An abstract statement, built once and then compiled exactly once.
/// Variants are immutable after `build()`.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementIntent {
    Select(SelectIntent),
    Insert(InsertIntent),
    Update(UpdateIntent),
    Delete(DeleteIntent),
}

impl StatementIntent {
    pub fn table(&self) -> &str {
        match self {
            Self::Select(intent) => &intent.table,
            Self::Insert(intent) => &intent.table,
            Self::Update(intent) => &intent.table,
            Self::Delete(intent) => &intent.table,
        }
    }

    /// Per-statement consistency override, if any.
    pub fn consistency(&self) -> Option<ConsistencyLevel> {
        match self {
            Self::Select(intent) => intent.consistency,
            Self::Insert(intent) => intent.consistency,
            Self::Update(intent) => intent.consistency,
            Self::Delete(intent) => intent.consistency,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectIntent {
    pub(crate) table: String,
    pub(crate) columns: Vec<String>,
    pub(crate) aggregate: Option<Aggregate>,
    pub(crate) predicates: Vec<Predicate>,
    pub(crate) order_by: Vec<(String, SortOrder)>,
    pub(crate) limit: Option<u32>,
    pub(crate) offset: Option<u32>,
    pub(crate) allow_filtering: bool,
    pub(crate) consistency: Option<ConsistencyLevel>,
}

impl SelectIntent {
    pub fn builder(table: impl Into<String>) -> SelectBuilder {
        SelectBuilder {
            table: table.into(),
            columns: Vec::new(),
            aggregate: None,
            predicates: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            allow_filtering: false,
            consistency: None,
        }
    }
}

pub struct SelectBuilder {
    table: String,
    columns: Vec<String>,
    aggregate: Option<Aggregate>,
    predicates: Vec<Predicate>,
    order_by: Vec<(String, SortOrder)>,
    limit: Option<u32>,
    offset: Option<u32>,
    allow_filtering: bool,
    consistency: Option<ConsistencyLevel>,
}

impl SelectBuilder {
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn aggregate(mut self, function: AggregateFn, column: impl Into<String>) -> Self {
        self.aggregate = Some(Aggregate {
            function,
            column: column.into(),
        });
        self
    }

    pub fn filter(
        mut self,
        column: impl Into<String>,
        op: PredicateOp,
        value: impl Into<CqlValue>,
    ) -> Self {
        self.predicates.push(Predicate {
            column: column.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn filter_in<I, V>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CqlValue>,
    {
        self.predicates.push(Predicate {
            column: column.into(),
            op: PredicateOp::In,
            value: CqlValue::List(values.into_iter().map(Into::into).collect()),
        });
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Offset-based pagination has no stable form in the dialect; a select
    /// carrying an offset is rejected by the compiler.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn allow_filtering(mut self) -> Self {
        self.allow_filtering = true;
        self
    }

    pub fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = Some(level);
        self
    }

    pub fn build(self) -> Result<SelectIntent, CqlError> {
        if self.table.is_empty() {
            return Err(CqlError::MalformedStatement(
                "select requires a table name".to_string(),
            ));
        }

        Ok(SelectIntent {
            table: self.table,
            columns: self.columns,
            aggregate: self.aggregate,
            predicates: self.predicates,
            order_by: self.order_by,
            limit: self.limit,
            offset: self.offset,
            allow_filtering: self.allow_filtering,
            consistency: self.consistency,
        })
    }
}

/// One insert record: ordinary values bound positionally, collection values
/// rendered inline. All records of a statement must share one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRecord {
    pub(crate) values: Vec<(String, CqlValue)>,
    pub(crate) collections: Vec<(CollectionKind, String, CqlValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertIntent {
    pub(crate) table: String,
    pub(crate) records: Vec<InsertRecord>,
    pub(crate) consistency: Option<ConsistencyLevel>,
}

impl InsertIntent {
    pub fn builder(table: impl Into<String>) -> InsertBuilder {
        InsertBuilder {
            table: table.into(),
            records: Vec::new(),
            consistency: None,
            error: None,
        }
    }
}

pub struct InsertBuilder {
    table: String,
    records: Vec<InsertRecord>,
    consistency: Option<ConsistencyLevel>,
    error: Option<CqlError>,
}

impl InsertBuilder {
    /// Start a new record with its ordinary column values.
    pub fn record<I, S, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<CqlValue>,
    {
        self.records.push(InsertRecord {
            values: values
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
            collections: Vec::new(),
        });
        self
    }

    /// Attach a collection-typed column value to the current record.
    pub fn collection(
        mut self,
        kind: CollectionKind,
        column: impl Into<String>,
        value: impl Into<CqlValue>,
    ) -> Self {
        match self.records.last_mut() {
            Some(record) => {
                record
                    .collections
                    .push((kind, column.into(), value.into()));
            }
            None => {
                if self.error.is_none() {
                    self.error = Some(CqlError::MalformedStatement(
                        "collection value added before any record".to_string(),
                    ));
                }
            }
        }
        self
    }

    pub fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = Some(level);
        self
    }

    pub fn build(self) -> Result<InsertIntent, CqlError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.table.is_empty() {
            return Err(CqlError::MalformedStatement(
                "insert requires a table name".to_string(),
            ));
        }
        if self.records.is_empty() {
            return Err(CqlError::MalformedStatement(
                "insert requires at least one record".to_string(),
            ));
        }

        let shape: Vec<&String> = self.records[0].values.iter().map(|(c, _)| c).collect();
        let collection_shape: Vec<(CollectionKind, &String)> = self.records[0]
            .collections
            .iter()
            .map(|(kind, column, _)| (*kind, column))
            .collect();

        for record in &self.records {
            let columns: Vec<&String> = record.values.iter().map(|(c, _)| c).collect();
            let collections: Vec<(CollectionKind, &String)> = record
                .collections
                .iter()
                .map(|(kind, column, _)| (*kind, column))
                .collect();
            if columns != shape || collections != collection_shape {
                return Err(CqlError::MalformedStatement(
                    "all insert records must share the same column shape".to_string(),
                ));
            }
            for (_, column, _) in &record.collections {
                if record.values.iter().any(|(c, _)| c == column) {
                    return Err(CqlError::MalformedStatement(format!(
                        "collection column duplicates ordinary column: {}",
                        column
                    )));
                }
            }
        }

        Ok(InsertIntent {
            table: self.table,
            records: self.records,
            consistency: self.consistency,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateIntent {
    pub(crate) table: String,
    pub(crate) assignments: Vec<(String, CqlValue)>,
    pub(crate) mutations: Vec<CollectionMutation>,
    pub(crate) predicates: Vec<Predicate>,
    pub(crate) consistency: Option<ConsistencyLevel>,
}

impl UpdateIntent {
    pub fn builder(table: impl Into<String>) -> UpdateBuilder {
        UpdateBuilder {
            table: table.into(),
            assignments: Vec::new(),
            mutations: Vec::new(),
            predicates: Vec::new(),
            consistency: None,
        }
    }
}

pub struct UpdateBuilder {
    table: String,
    assignments: Vec<(String, CqlValue)>,
    mutations: Vec<CollectionMutation>,
    predicates: Vec<Predicate>,
    consistency: Option<ConsistencyLevel>,
}

impl UpdateBuilder {
    pub fn set(mut self, column: impl Into<String>, value: impl Into<CqlValue>) -> Self {
        self.assignments.push((column.into(), value.into()));
        self
    }

    /// Replace a collection column wholesale: `col = {…}`.
    pub fn collection(
        self,
        kind: CollectionKind,
        column: impl Into<String>,
        value: impl Into<CqlValue>,
    ) -> Self {
        self.push_mutation(kind, column, None, value)
    }

    /// Mutate a collection column in place: `col = col + {…}`.
    pub fn collection_op(
        self,
        kind: CollectionKind,
        column: impl Into<String>,
        operation: CollectionOp,
        value: impl Into<CqlValue>,
    ) -> Self {
        self.push_mutation(kind, column, Some(operation), value)
    }

    fn push_mutation(
        mut self,
        kind: CollectionKind,
        column: impl Into<String>,
        operation: Option<CollectionOp>,
        value: impl Into<CqlValue>,
    ) -> Self {
        self.mutations.push(CollectionMutation {
            column: column.into(),
            kind,
            operation,
            value: value.into(),
        });
        self
    }

    pub fn filter(
        mut self,
        column: impl Into<String>,
        op: PredicateOp,
        value: impl Into<CqlValue>,
    ) -> Self {
        self.predicates.push(Predicate {
            column: column.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = Some(level);
        self
    }

    pub fn build(self) -> Result<UpdateIntent, CqlError> {
        if self.table.is_empty() {
            return Err(CqlError::MalformedStatement(
                "update requires a table name".to_string(),
            ));
        }
        if self.assignments.is_empty() && self.mutations.is_empty() {
            return Err(CqlError::MalformedStatement(
                "update requires at least one assignment".to_string(),
            ));
        }
        for mutation in &self.mutations {
            if self.assignments.iter().any(|(c, _)| *c == mutation.column) {
                return Err(CqlError::MalformedStatement(format!(
                    "collection mutation duplicates assigned column: {}",
                    mutation.column
                )));
            }
        }

        Ok(UpdateIntent {
            table: self.table,
            assignments: self.assignments,
            mutations: self.mutations,
            predicates: self.predicates,
            consistency: self.consistency,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteIntent {
    pub(crate) table: String,
    pub(crate) predicates: Vec<Predicate>,
    pub(crate) consistency: Option<ConsistencyLevel>,
}

impl DeleteIntent {
    pub fn builder(table: impl Into<String>) -> DeleteBuilder {
        DeleteBuilder {
            table: table.into(),
            predicates: Vec::new(),
            consistency: None,
        }
    }
}

pub struct DeleteBuilder {
    table: String,
    predicates: Vec<Predicate>,
    consistency: Option<ConsistencyLevel>,
}

impl DeleteBuilder {
    pub fn filter(
        mut self,
        column: impl Into<String>,
        op: PredicateOp,
        value: impl Into<CqlValue>,
    ) -> Self {
        self.predicates.push(Predicate {
            column: column.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = Some(level);
        self
    }

    pub fn build(self) -> Result<DeleteIntent, CqlError> {
        if self.table.is_empty() {
            return Err(CqlError::MalformedStatement(
                "delete requires a table name".to_string(),
            ));
        }

        Ok(DeleteIntent {
            table: self.table,
            predicates: self.predicates,
            consistency: self.consistency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_requires_table() {
        let result = SelectIntent::builder("").build();
        assert!(matches!(result, Err(CqlError::MalformedStatement(_))));
    }

    #[test]
    fn test_insert_records_must_share_shape() {
        let result = InsertIntent::builder("users")
            .record([("id", CqlValue::Int(1)), ("name", CqlValue::from("ada"))])
            .record([("id", CqlValue::Int(2))])
            .build();

        assert!(matches!(result, Err(CqlError::MalformedStatement(_))));
    }

    #[test]
    fn test_insert_collection_before_record_is_rejected() {
        let result = InsertIntent::builder("users")
            .collection(CollectionKind::Set, "tags", CqlValue::List(vec![]))
            .build();

        assert!(matches!(result, Err(CqlError::MalformedStatement(_))));
    }

    #[test]
    fn test_insert_collection_column_must_not_duplicate_ordinary() {
        let result = InsertIntent::builder("users")
            .record([("tags", CqlValue::Int(1))])
            .collection(CollectionKind::Set, "tags", CqlValue::List(vec![]))
            .build();

        assert!(matches!(result, Err(CqlError::MalformedStatement(_))));
    }

    #[test]
    fn test_update_requires_assignments() {
        let result = UpdateIntent::builder("users")
            .filter("id", PredicateOp::Eq, 1)
            .build();

        assert!(matches!(result, Err(CqlError::MalformedStatement(_))));
    }

    #[test]
    fn test_update_mutation_must_not_duplicate_assignment() {
        let result = UpdateIntent::builder("users")
            .set("tags", CqlValue::Int(1))
            .collection(
                CollectionKind::Set,
                "tags",
                CqlValue::List(vec![CqlValue::Int(1)]),
            )
            .build();

        assert!(matches!(result, Err(CqlError::MalformedStatement(_))));
    }

    #[test]
    fn test_builders_produce_immutable_intents() {
        let intent = SelectIntent::builder("users")
            .columns(["id", "name"])
            .filter("id", PredicateOp::Eq, 7)
            .limit(10)
            .build()
            .unwrap();

        assert_eq!(intent.table, "users");
        assert_eq!(intent.columns, vec!["id", "name"]);
        assert_eq!(intent.limit, Some(10));
    }
}
