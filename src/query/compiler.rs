use crate::errors::CqlError;
use crate::ident;
use crate::value::CqlValue;

use super::intent::{
    CollectionKind, DeleteIntent, InsertIntent, Predicate, PredicateOp, SelectIntent,
    StatementIntent, UpdateIntent,
};

/// Compiled statement text plus its positional bindings, in clause order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub cql: String,
    pub bindings: Vec<CqlValue>,
}

/// Translates statement intents into dialect text.
///
/// Predicate and assignment values become positional `?` parameters;
/// collection-typed values are always rendered as inline literals because
/// the dialect cannot bind them.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    keyspace: Option<String>,
    table_prefix: String,
}

impl QueryCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        let keyspace = keyspace.into();
        self.keyspace = (!keyspace.is_empty()).then_some(keyspace);
        self
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn compile(&self, intent: &StatementIntent) -> Result<CompiledStatement, CqlError> {
        match intent {
            StatementIntent::Select(intent) => self.compile_select(intent),
            StatementIntent::Insert(intent) => self.compile_insert(intent),
            StatementIntent::Update(intent) => self.compile_update(intent),
            StatementIntent::Delete(intent) => self.compile_delete(intent),
        }
    }

    /// Clause order is fixed: aggregate/columns, from, where, order by,
    /// limit, allow filtering.
    pub fn compile_select(&self, intent: &SelectIntent) -> Result<CompiledStatement, CqlError> {
        if intent.offset.is_some() {
            return Err(CqlError::UnsupportedFeature(
                "offset pagination is not supported; reads page forward via continuation tokens"
                    .to_string(),
            ));
        }

        let mut bindings = Vec::new();
        let mut parts = Vec::new();

        let head = match &intent.aggregate {
            Some(aggregate) => format!(
                "select {}({}) as aggregate",
                aggregate.function.as_cql(),
                ident::wrap_value(&aggregate.column)
            ),
            None if intent.columns.is_empty() => "select *".to_string(),
            None => format!("select {}", ident::columnize(&intent.columns)),
        };
        parts.push(head);
        parts.push(format!("from {}", self.wrap_table(&intent.table)));

        let wheres = self.compile_wheres(&intent.predicates, &mut bindings)?;
        if !wheres.is_empty() {
            parts.push(wheres);
        }

        if !intent.order_by.is_empty() {
            let orders: Vec<String> = intent
                .order_by
                .iter()
                .map(|(column, order)| {
                    format!("{} {}", ident::wrap_value(column), order.as_cql())
                })
                .collect();
            parts.push(format!("order by {}", orders.join(", ")));
        }

        if let Some(limit) = intent.limit {
            parts.push(format!("limit {}", limit));
        }

        if intent.allow_filtering {
            parts.push("allow filtering".to_string());
        }

        Ok(CompiledStatement {
            cql: parts.join(" "),
            bindings,
        })
    }

    /// Every insert compiles in a batch-capable shape: one column list and
    /// one grouped value tuple per record. Ordinary columns come first and
    /// collection columns last, in both the column list and each tuple, so
    /// the two stay index-aligned.
    pub fn compile_insert(&self, intent: &InsertIntent) -> Result<CompiledStatement, CqlError> {
        let first = &intent.records[0];

        let mut columns: Vec<&str> = first.values.iter().map(|(c, _)| c.as_str()).collect();
        columns.extend(first.collections.iter().map(|(_, c, _)| c.as_str()));

        let mut bindings = Vec::new();
        let mut tuples = Vec::new();
        for record in &intent.records {
            let mut slots: Vec<String> = Vec::with_capacity(columns.len());
            for (_, value) in &record.values {
                bindings.push(value.clone());
                slots.push("?".to_string());
            }
            for (kind, _, value) in &record.collections {
                slots.push(Self::render_collection(*kind, value)?);
            }
            tuples.push(format!("({})", slots.join(", ")));
        }

        Ok(CompiledStatement {
            cql: format!(
                "insert into {} ({}) values {}",
                self.wrap_table(&intent.table),
                ident::columnize(&columns),
                tuples.join(", ")
            ),
            bindings,
        })
    }

    pub fn compile_update(&self, intent: &UpdateIntent) -> Result<CompiledStatement, CqlError> {
        let mut bindings = Vec::new();
        let mut assignments = Vec::new();

        for (column, value) in &intent.assignments {
            let column = ident::wrap_value(column);
            if value.is_collection() {
                assignments.push(format!("{} = {}", column, value.literal()));
            } else {
                bindings.push(value.clone());
                assignments.push(format!("{} = ?", column));
            }
        }

        for mutation in &intent.mutations {
            let column = ident::wrap_value(&mutation.column);
            let literal = Self::render_collection(mutation.kind, &mutation.value)?;
            match mutation.operation {
                Some(operation) => assignments.push(format!(
                    "{} = {} {} {}",
                    column,
                    column,
                    operation.as_cql(),
                    literal
                )),
                None => assignments.push(format!("{} = {}", column, literal)),
            }
        }

        let mut cql = format!(
            "update {} set {}",
            self.wrap_table(&intent.table),
            assignments.join(", ")
        );

        let wheres = self.compile_wheres(&intent.predicates, &mut bindings)?;
        if !wheres.is_empty() {
            cql.push(' ');
            cql.push_str(&wheres);
        }

        Ok(CompiledStatement { cql, bindings })
    }

    pub fn compile_delete(&self, intent: &DeleteIntent) -> Result<CompiledStatement, CqlError> {
        let mut bindings = Vec::new();
        let mut cql = format!("delete from {}", self.wrap_table(&intent.table));

        let wheres = self.compile_wheres(&intent.predicates, &mut bindings)?;
        if !wheres.is_empty() {
            cql.push(' ');
            cql.push_str(&wheres);
        }

        Ok(CompiledStatement { cql, bindings })
    }

    /// Wrap pre-compiled statements in a logged-batch envelope.
    pub fn compile_batch(queries: &[String]) -> String {
        let mut batch = String::from("BEGIN BATCH\n");
        for query in queries {
            batch.push_str(&format!("  {};\n", query));
        }
        batch.push_str("APPLY BATCH;");
        batch
    }

    /// The dialect has no generated keys to return.
    pub fn compile_insert_get_id(&self, _intent: &InsertIntent) -> Result<CompiledStatement, CqlError> {
        Err(CqlError::UnsupportedFeature(
            "insert returning a generated id".to_string(),
        ))
    }

    fn compile_wheres(
        &self,
        predicates: &[Predicate],
        bindings: &mut Vec<CqlValue>,
    ) -> Result<String, CqlError> {
        if predicates.is_empty() {
            return Ok(String::new());
        }

        let mut parts = Vec::new();
        for predicate in predicates {
            let column = ident::wrap_value(&predicate.column);
            match predicate.op {
                PredicateOp::In => {
                    let items = match &predicate.value {
                        CqlValue::List(items) => items,
                        _ => {
                            return Err(CqlError::MalformedStatement(
                                "in predicate requires a sequence of values".to_string(),
                            ))
                        }
                    };
                    let placeholders = vec!["?"; items.len()].join(", ");
                    bindings.extend(items.iter().cloned());
                    parts.push(format!("{} in ({})", column, placeholders));
                }
                op => {
                    if predicate.value.is_collection() {
                        parts.push(format!(
                            "{} {} {}",
                            column,
                            op.as_cql(),
                            predicate.value.literal()
                        ));
                    } else {
                        bindings.push(predicate.value.clone());
                        parts.push(format!("{} {} ?", column, op.as_cql()));
                    }
                }
            }
        }

        Ok(format!("where {}", parts.join(" and ")))
    }

    /// Render a collection value in its bracketed form: set `{…}`,
    /// list `[…]`, map `{k:v, …}`.
    fn render_collection(kind: CollectionKind, value: &CqlValue) -> Result<String, CqlError> {
        let items = Self::collection_items(kind, value)?;
        Ok(match kind {
            CollectionKind::Set | CollectionKind::Map => format!("{{{}}}", items),
            CollectionKind::List => format!("[{}]", items),
        })
    }

    /// Render the comma-joined items of a collection literal, preserving
    /// input order. Map values keep the original's two shapes: key/value
    /// pairs render `k:v`, a sequential value renders bare items.
    fn collection_items(kind: CollectionKind, value: &CqlValue) -> Result<String, CqlError> {
        match (kind, value) {
            (CollectionKind::Set | CollectionKind::List, CqlValue::List(items)) => Ok(items
                .iter()
                .map(CqlValue::literal)
                .collect::<Vec<_>>()
                .join(", ")),
            (CollectionKind::Map, CqlValue::Map(pairs)) => Ok(pairs
                .iter()
                .map(|(key, value)| format!("{}:{}", key.literal(), value.literal()))
                .collect::<Vec<_>>()
                .join(", ")),
            (CollectionKind::Map, CqlValue::List(items)) => Ok(items
                .iter()
                .map(CqlValue::literal)
                .collect::<Vec<_>>()
                .join(", ")),
            _ => Err(CqlError::MalformedStatement(
                "collection value must be a sequence".to_string(),
            )),
        }
    }

    fn wrap_table(&self, table: &str) -> String {
        let table = ident::wrap_value(&format!("{}{}", self.table_prefix, table));
        match &self.keyspace {
            Some(keyspace) => format!("{}.{}", ident::wrap_value(keyspace), table),
            None => table,
        }
    }
}
