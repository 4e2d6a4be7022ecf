use std::collections::HashMap;

use async_trait::async_trait;

use crate::consistency::ConsistencyLevel;
use crate::errors::CqlError;
use crate::value::CqlValue;

/// Result kind tag distinguishing row-bearing results from the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Rows,
    Void,
    SetKeyspace,
    SchemaChange,
}

/// A single result row, keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub columns: HashMap<String, CqlValue>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&CqlValue> {
        self.columns.get(column)
    }
}

/// A transport result: rows, the optional continuation token from the result
/// metadata, and any server-reported warnings.
#[derive(Debug, Clone)]
pub struct CqlResult {
    pub kind: ResultKind,
    pub rows: Vec<Row>,
    pub paging_state: Option<Vec<u8>>,
    pub warnings: Vec<String>,
}

impl CqlResult {
    pub fn void() -> Self {
        Self {
            kind: ResultKind::Void,
            rows: Vec::new(),
            paging_state: None,
            warnings: Vec::new(),
        }
    }

    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            kind: ResultKind::Rows,
            rows,
            paging_state: None,
            warnings: Vec::new(),
        }
    }

    pub fn with_paging_state(mut self, token: Vec<u8>) -> Self {
        self.paging_state = Some(token);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Row count of a row-bearing result; anything else is a shape error.
    pub fn row_count(&self) -> Result<usize, CqlError> {
        if self.kind != ResultKind::Rows {
            return Err(CqlError::TypeMismatch(
                "result does not carry rows".to_string(),
            ));
        }
        Ok(self.rows.len())
    }
}

/// Handle for a statement prepared by the transport.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub id: u64,
    pub cql: String,
}

/// Per-execution options: page size and the continuation token from the
/// previous page, when resuming a read.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    pub page_size: Option<i32>,
    pub paging_state: Option<Vec<u8>>,
}

/// The external wire collaborator. Implementations own node selection,
/// connection pooling and protocol framing; this crate only compiles
/// statements and drives the execution protocol against this surface.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn prepare(&self, cql: &str) -> Result<Prepared, CqlError>;

    async fn execute(
        &self,
        statement: &Prepared,
        values: &[CqlValue],
        consistency: ConsistencyLevel,
        options: &ExecuteOptions,
    ) -> Result<CqlResult, CqlError>;

    /// Run an unprepared statement.
    async fn query(
        &self,
        cql: &str,
        consistency: ConsistencyLevel,
        options: &ExecuteOptions,
    ) -> Result<CqlResult, CqlError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_requires_rows_kind() {
        let result = CqlResult::void();
        assert!(matches!(
            result.row_count(),
            Err(CqlError::TypeMismatch(_))
        ));

        let result = CqlResult::rows(vec![Row::default()]);
        assert_eq!(result.row_count().unwrap(), 1);
    }
}
