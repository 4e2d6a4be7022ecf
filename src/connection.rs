use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::consistency::ConsistencyLevel;
use crate::errors::CqlError;
use crate::query::compiler::QueryCompiler;
use crate::query::intent::{SelectIntent, StatementIntent};
use crate::schema::compiler::{SchemaCompiler, SchemaStatement};
use crate::transport::{CqlResult, ExecuteOptions, Prepared, ResultKind, Row, Transport};
use crate::value::CqlValue;

/// Pluggable sink for server-reported warnings.
pub type WarningHandler = dyn Fn(&str) + Send + Sync;

/// Per-statement execution options. Anything left unset falls back to the
/// connection-wide configuration.
#[derive(Clone, Default)]
pub struct StatementOptions {
    pub consistency: Option<ConsistencyLevel>,
    pub suppress_warnings: bool,
    /// Route this read through the primary link.
    pub use_primary: bool,
    pub warning_handler: Option<Arc<WarningHandler>>,
}

/// Paging position of one read execution. Once the continuation token comes
/// back absent the read is permanently over; the state is never re-queried.
#[derive(Debug, Clone)]
pub struct PagingState {
    pub token: Option<Vec<u8>>,
    pub page_size: i32,
    pub exhausted: bool,
}

impl PagingState {
    pub fn new(page_size: i32) -> Self {
        Self {
            token: None,
            page_size,
            exhausted: false,
        }
    }

    /// Record the continuation token of the page just read.
    pub fn advance(&mut self, token: Option<Vec<u8>>) {
        if token.is_none() {
            self.exhausted = true;
        }
        self.token = token;
    }
}

#[derive(Clone)]
struct WarningSink {
    enabled: bool,
    handler: Option<Arc<WarningHandler>>,
}

impl WarningSink {
    fn surface(&self, warnings: &[String], cql: &str) {
        if !self.enabled {
            return;
        }
        for warning in warnings {
            let message = format!("Warning - {}: {}", warning, cql);
            match &self.handler {
                Some(handler) => handler(&message),
                None => warn!("{}", message),
            }
        }
    }
}

/// Lazy row sequence over a paginated read.
///
/// Rows are yielded one at a time from an in-memory page buffer; the only
/// suspension point is the fetch between page boundaries, driven by consumer
/// demand. There is no mid-fetch cancellation: exhaust the stream or drop it
/// along with its link.
pub struct RowStream {
    transport: Arc<dyn Transport>,
    prepared: Prepared,
    bindings: Vec<CqlValue>,
    consistency: ConsistencyLevel,
    paging: PagingState,
    buffer: VecDeque<Row>,
    started: bool,
    warnings: WarningSink,
}

impl RowStream {
    /// Next row, fetching the next page when the buffer runs dry.
    pub async fn try_next(&mut self) -> Result<Option<Row>, CqlError> {
        loop {
            if let Some(row) = self.buffer.pop_front() {
                return Ok(Some(row));
            }
            if self.started && self.paging.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Drain the remaining rows eagerly.
    pub async fn collect_rows(mut self) -> Result<Vec<Row>, CqlError> {
        let mut rows = Vec::new();
        while let Some(row) = self.try_next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn fetch_page(&mut self) -> Result<(), CqlError> {
        let options = ExecuteOptions {
            page_size: Some(self.paging.page_size),
            paging_state: self.paging.token.clone(),
        };
        let result = self
            .transport
            .execute(&self.prepared, &self.bindings, self.consistency, &options)
            .await?;
        self.warnings.surface(&result.warnings, &self.prepared.cql);
        self.paging.advance(result.paging_state);
        self.buffer.extend(result.rows);
        self.started = true;
        Ok(())
    }
}

/// A logical connection: a primary (write) link, an optional read link, and
/// the compilers configured for the connection's keyspace.
///
/// Consistency is resolved per statement - explicit override, else the
/// connection default - and handed to the transport as a call argument, so
/// no level ever lingers between statements.
pub struct Connection {
    transport: Arc<dyn Transport>,
    read_transport: Option<Arc<dyn Transport>>,
    config: ConnectionConfig,
    query_compiler: QueryCompiler,
    schema_compiler: SchemaCompiler,
    records_modified: bool,
    reads_pinned: bool,
    warnings_enabled: bool,
    warning_handler: Option<Arc<WarningHandler>>,
}

impl Connection {
    pub fn new(transport: Arc<dyn Transport>, config: ConnectionConfig) -> Self {
        info!("Opening connection to hosts: {}", config.host);

        let query_compiler = QueryCompiler::new()
            .with_keyspace(config.keyspace.clone())
            .with_table_prefix(config.table_prefix.clone());
        let mut schema_compiler = SchemaCompiler::new()
            .with_keyspace(config.keyspace.clone())
            .with_table_prefix(config.table_prefix.clone());
        if let Some(replication) = config.default_replication.clone() {
            schema_compiler = schema_compiler.with_default_replication(replication);
        }

        Self {
            transport,
            read_transport: None,
            config,
            query_compiler,
            schema_compiler,
            records_modified: false,
            reads_pinned: false,
            warnings_enabled: true,
            warning_handler: None,
        }
    }

    /// Attach a separate link for reads. Writes keep using the primary.
    pub fn with_read_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.read_transport = Some(transport);
        self
    }

    pub fn keyspace(&self) -> &str {
        &self.config.keyspace
    }

    pub fn table_prefix(&self) -> &str {
        &self.config.table_prefix
    }

    pub fn page_size(&self) -> i32 {
        self.config.page_size
    }

    pub fn query_compiler(&self) -> &QueryCompiler {
        &self.query_compiler
    }

    pub fn schema_compiler(&self) -> &SchemaCompiler {
        &self.schema_compiler
    }

    /// Force all reads through the primary link.
    pub fn pin_reads_to_primary(&mut self, pinned: bool) {
        self.reads_pinned = pinned;
    }

    pub fn ignore_warnings(&mut self) {
        self.warnings_enabled = false;
    }

    pub fn log_warnings(&mut self) {
        self.warnings_enabled = true;
    }

    pub fn set_warning_handler(&mut self, handler: impl Fn(&str) + Send + Sync + 'static) {
        self.warning_handler = Some(Arc::new(handler));
    }

    /// Run a mutating statement and report the number of affected rows.
    ///
    /// The dialect exposes no affected-row counts for mutations, so a
    /// successful statement always reports exactly one row. This is a
    /// documented approximation, not a measurement.
    pub async fn affecting_statement(
        &mut self,
        cql: &str,
        bindings: &[CqlValue],
        options: &StatementOptions,
    ) -> Result<u64, CqlError> {
        self.execute_mutating(cql, bindings, options).await?;
        Ok(1)
    }

    /// Run a statement for effect, reporting only success.
    pub async fn statement(
        &mut self,
        cql: &str,
        bindings: &[CqlValue],
        options: &StatementOptions,
    ) -> Result<bool, CqlError> {
        self.execute_mutating(cql, bindings, options).await?;
        Ok(true)
    }

    /// Run a raw statement without preparing it first. A row-bearing result
    /// counts as a change when it carries at least one row.
    pub async fn unprepared(
        &mut self,
        cql: &str,
        options: &StatementOptions,
    ) -> Result<bool, CqlError> {
        debug!("executing unprepared statement: {}", cql);
        let consistency = self.effective_consistency(options.consistency);
        let sink = self.warning_sink(options);

        let result = self
            .transport
            .query(cql, consistency, &ExecuteOptions::default())
            .await?;
        sink.surface(&result.warnings, cql);

        let count = if result.kind == ResultKind::Rows {
            result.rows.len()
        } else {
            0
        };
        let changed = count > 0;
        if changed {
            self.records_modified = true;
        }
        Ok(changed)
    }

    /// Run a read eagerly: prepare once, then page forward until the
    /// continuation token is absent, concatenating pages in order.
    pub async fn select(
        &self,
        cql: &str,
        bindings: &[CqlValue],
        options: &StatementOptions,
    ) -> Result<Vec<Row>, CqlError> {
        debug!("executing select: {}", cql);
        let link = self.read_link(options);
        let consistency = self.effective_consistency(options.consistency);
        let sink = self.warning_sink(options);

        let prepared = link.prepare(cql).await?;
        let mut paging = PagingState::new(self.config.page_size);
        let mut rows = Vec::new();
        loop {
            let exec_options = ExecuteOptions {
                page_size: Some(paging.page_size),
                paging_state: paging.token.clone(),
            };
            let result = link
                .execute(&prepared, bindings, consistency, &exec_options)
                .await?;
            sink.surface(&result.warnings, cql);
            paging.advance(result.paging_state.clone());
            rows.extend(result.rows);
            if paging.exhausted {
                break;
            }
        }
        Ok(rows)
    }

    /// Run a read lazily, yielding rows on demand page by page.
    pub async fn cursor(
        &self,
        cql: &str,
        bindings: &[CqlValue],
        options: &StatementOptions,
    ) -> Result<RowStream, CqlError> {
        debug!("opening cursor: {}", cql);
        let link = self.read_link(options);
        let prepared = link.prepare(cql).await?;

        Ok(RowStream {
            transport: link,
            prepared,
            bindings: bindings.to_vec(),
            consistency: self.effective_consistency(options.consistency),
            paging: PagingState::new(self.config.page_size),
            buffer: VecDeque::new(),
            started: false,
            warnings: self.warning_sink(options),
        })
    }

    /// Compile and run a mutating intent.
    pub async fn run(&mut self, intent: &StatementIntent) -> Result<u64, CqlError> {
        if matches!(intent, StatementIntent::Select(_)) {
            return Err(CqlError::TypeMismatch(
                "select statements yield rows, not an affected-row count".to_string(),
            ));
        }
        let compiled = self.query_compiler.compile(intent)?;
        let options = StatementOptions {
            consistency: intent.consistency(),
            ..Default::default()
        };
        self.affecting_statement(&compiled.cql, &compiled.bindings, &options)
            .await
    }

    /// Compile and run a select eagerly.
    pub async fn run_select(&self, intent: &SelectIntent) -> Result<Vec<Row>, CqlError> {
        let compiled = self.query_compiler.compile_select(intent)?;
        let options = StatementOptions {
            consistency: intent.consistency,
            ..Default::default()
        };
        self.select(&compiled.cql, &compiled.bindings, &options).await
    }

    /// Compile a select and open a lazy cursor over it.
    pub async fn stream(&self, intent: &SelectIntent) -> Result<RowStream, CqlError> {
        let compiled = self.query_compiler.compile_select(intent)?;
        let options = StatementOptions {
            consistency: intent.consistency,
            ..Default::default()
        };
        self.cursor(&compiled.cql, &compiled.bindings, &options).await
    }

    /// Compile and run a schema statement.
    pub async fn execute_schema(&mut self, statement: &SchemaStatement) -> Result<bool, CqlError> {
        let cql = self.schema_compiler.compile(statement)?;
        self.statement(&cql, &[], &StatementOptions::default()).await
    }

    async fn execute_mutating(
        &mut self,
        cql: &str,
        bindings: &[CqlValue],
        options: &StatementOptions,
    ) -> Result<CqlResult, CqlError> {
        debug!("executing statement: {}", cql);
        let consistency = self.effective_consistency(options.consistency);
        let sink = self.warning_sink(options);

        let prepared = self.transport.prepare(cql).await?;
        let result = self
            .transport
            .execute(&prepared, bindings, consistency, &ExecuteOptions::default())
            .await?;
        sink.surface(&result.warnings, cql);
        self.records_modified = true;
        Ok(result)
    }

    fn effective_consistency(&self, override_level: Option<ConsistencyLevel>) -> ConsistencyLevel {
        override_level.unwrap_or(self.config.consistency)
    }

    /// Pick the link for a read: the primary when pinned, requested per
    /// call, or when stickiness is on and a write has occurred; otherwise
    /// the read link when one is attached.
    fn read_link(&self, options: &StatementOptions) -> Arc<dyn Transport> {
        if options.use_primary
            || self.reads_pinned
            || (self.config.sticky && self.records_modified)
        {
            return Arc::clone(&self.transport);
        }
        match &self.read_transport {
            Some(read) => Arc::clone(read),
            None => Arc::clone(&self.transport),
        }
    }

    fn warning_sink(&self, options: &StatementOptions) -> WarningSink {
        WarningSink {
            enabled: self.warnings_enabled && !options.suppress_warnings,
            handler: options
                .warning_handler
                .clone()
                .or_else(|| self.warning_handler.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::query::intent::PredicateOp;
    use crate::transport::mock::{row, ScriptedTransport};

    fn page(ids: &[i32], token: Option<&[u8]>) -> CqlResult {
        let rows = ids
            .iter()
            .map(|id| row(&[("id", CqlValue::Int(*id))]))
            .collect();
        let result = CqlResult::rows(rows);
        match token {
            Some(token) => result.with_paging_state(token.to_vec()),
            None => result,
        }
    }

    fn connection(transport: Arc<ScriptedTransport>) -> Connection {
        Connection::new(transport, ConnectionConfig::default())
    }

    #[tokio::test]
    async fn test_select_pages_until_token_is_absent() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            page(&[1, 2], Some(b"t1")),
            page(&[3], Some(b"t2")),
            page(&[4], None),
        ]));
        let conn = connection(transport.clone());

        let rows = conn
            .select("select * from \"users\"", &[], &StatementOptions::default())
            .await
            .unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3].get("id"), Some(&CqlValue::Int(4)));
        assert_eq!(transport.call_count(), 3);

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0].paging_state, None);
        assert_eq!(calls[1].paging_state, Some(b"t1".to_vec()));
        assert_eq!(calls[2].paging_state, Some(b"t2".to_vec()));
        assert!(calls.iter().all(|call| call.page_size == Some(500)));
    }

    #[tokio::test]
    async fn test_cursor_fetches_pages_on_demand() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            page(&[1, 2], Some(b"t1")),
            page(&[3], None),
        ]));
        let conn = connection(transport.clone());

        let mut stream = conn
            .cursor("select * from \"users\"", &[], &StatementOptions::default())
            .await
            .unwrap();
        assert_eq!(transport.call_count(), 0);

        assert!(stream.try_next().await.unwrap().is_some());
        assert!(stream.try_next().await.unwrap().is_some());
        assert_eq!(transport.call_count(), 1);

        assert!(stream.try_next().await.unwrap().is_some());
        assert_eq!(transport.call_count(), 2);

        assert!(stream.try_next().await.unwrap().is_none());
        // An exhausted read is never re-queried.
        assert!(stream.try_next().await.unwrap().is_none());
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_cursor_skips_empty_pages_with_tokens() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            page(&[], Some(b"t1")),
            page(&[7], None),
        ]));
        let conn = connection(transport.clone());

        let mut stream = conn
            .cursor("select * from \"users\"", &[], &StatementOptions::default())
            .await
            .unwrap();

        let first = stream.try_next().await.unwrap().unwrap();
        assert_eq!(first.get("id"), Some(&CqlValue::Int(7)));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_collect_rows_drains_the_stream() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            page(&[1], Some(b"t1")),
            page(&[2, 3], None),
        ]));
        let conn = connection(transport);

        let stream = conn
            .cursor("select * from \"users\"", &[], &StatementOptions::default())
            .await
            .unwrap();
        let rows = stream.collect_rows().await.unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn test_affecting_statement_reports_one_row() {
        let transport = Arc::new(ScriptedTransport::new(vec![CqlResult::void()]));
        let mut conn = connection(transport);

        let affected = conn
            .affecting_statement(
                "delete from \"users\" where \"id\" = ?",
                &[CqlValue::Int(1)],
                &StatementOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_unprepared_reports_change_from_row_count() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            page(&[1, 2], None),
            CqlResult::void(),
        ]));
        let mut conn = connection(transport);

        assert!(conn
            .unprepared("select * from system.local", &StatementOptions::default())
            .await
            .unwrap());
        assert!(!conn
            .unprepared("truncate \"users\"", &StatementOptions::default())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_statement_consistency_override_beats_default() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            CqlResult::void(),
            CqlResult::void(),
        ]));
        let mut conn = connection(transport.clone());

        conn.statement("truncate \"users\"", &[], &StatementOptions::default())
            .await
            .unwrap();
        conn.statement(
            "truncate \"users\"",
            &[],
            &StatementOptions {
                consistency: Some(ConsistencyLevel::Quorum),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0].consistency, ConsistencyLevel::LocalOne);
        assert_eq!(calls[1].consistency, ConsistencyLevel::Quorum);
    }

    #[tokio::test]
    async fn test_consistency_override_does_not_leak_into_next_statement() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            CqlResult::void(),
            CqlResult::void(),
        ]));
        let mut conn = connection(transport.clone());

        conn.statement(
            "truncate \"users\"",
            &[],
            &StatementOptions {
                consistency: Some(ConsistencyLevel::All),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        conn.statement("truncate \"users\"", &[], &StatementOptions::default())
            .await
            .unwrap();

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[1].consistency, ConsistencyLevel::LocalOne);
    }

    #[tokio::test]
    async fn test_warning_handler_receives_messages() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            CqlResult::void().with_warning("Aggregation query used without partition key")
        ]));
        let mut conn = connection(transport);

        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        conn.set_warning_handler(move |message| {
            sink.lock().unwrap().push(message.to_string());
        });

        conn.statement("truncate \"users\"", &[], &StatementOptions::default())
            .await
            .unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert!(captured[0].starts_with("Warning - Aggregation query"));
        assert!(captured[0].ends_with("truncate \"users\""));
    }

    #[tokio::test]
    async fn test_warnings_can_be_suppressed() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            CqlResult::void().with_warning("w1"),
            CqlResult::void().with_warning("w2"),
        ]));
        let mut conn = connection(transport);

        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        conn.set_warning_handler(move |message| {
            sink.lock().unwrap().push(message.to_string());
        });

        // Per-statement suppression.
        conn.statement(
            "truncate \"users\"",
            &[],
            &StatementOptions {
                suppress_warnings: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(captured.lock().unwrap().is_empty());

        // Connection-wide suppression.
        conn.ignore_warnings();
        conn.statement("truncate \"users\"", &[], &StatementOptions::default())
            .await
            .unwrap();
        assert!(captured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_use_read_link_when_attached() {
        let primary = Arc::new(ScriptedTransport::new(vec![]));
        let replica = Arc::new(ScriptedTransport::new(vec![page(&[1], None)]));
        let conn = Connection::new(primary.clone(), ConnectionConfig::default())
            .with_read_transport(replica.clone());

        conn.select("select * from \"users\"", &[], &StatementOptions::default())
            .await
            .unwrap();

        assert_eq!(primary.call_count(), 0);
        assert_eq!(replica.call_count(), 1);
    }

    #[tokio::test]
    async fn test_sticky_reads_return_to_primary_after_a_write() {
        let primary = Arc::new(ScriptedTransport::new(vec![
            CqlResult::void(),
            page(&[1], None),
        ]));
        let replica = Arc::new(ScriptedTransport::new(vec![]));
        let config = ConnectionConfig {
            sticky: true,
            ..Default::default()
        };
        let mut conn =
            Connection::new(primary.clone(), config).with_read_transport(replica.clone());

        conn.statement("truncate \"users\"", &[], &StatementOptions::default())
            .await
            .unwrap();
        conn.select("select * from \"users\"", &[], &StatementOptions::default())
            .await
            .unwrap();

        assert_eq!(primary.call_count(), 2);
        assert_eq!(replica.call_count(), 0);
    }

    #[tokio::test]
    async fn test_read_can_be_forced_onto_primary_per_call() {
        let primary = Arc::new(ScriptedTransport::new(vec![page(&[1], None)]));
        let replica = Arc::new(ScriptedTransport::new(vec![]));
        let conn = Connection::new(primary.clone(), ConnectionConfig::default())
            .with_read_transport(replica.clone());

        conn.select(
            "select * from \"users\"",
            &[],
            &StatementOptions {
                use_primary: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(primary.call_count(), 1);
        assert_eq!(replica.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_select_compiles_and_pages() {
        let transport = Arc::new(ScriptedTransport::new(vec![page(&[5], None)]));
        let conn = connection(transport.clone());

        let intent = SelectIntent::builder("users")
            .filter("id", PredicateOp::Eq, 5)
            .consistency(ConsistencyLevel::Quorum)
            .build()
            .unwrap();
        let rows = conn.run_select(&intent).await.unwrap();

        assert_eq!(rows.len(), 1);
        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0].cql, "select * from \"users\" where \"id\" = ?");
        assert_eq!(calls[0].values, vec![CqlValue::Int(5)]);
        assert_eq!(calls[0].consistency, ConsistencyLevel::Quorum);
    }

    #[tokio::test]
    async fn test_run_rejects_select_intents() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let mut conn = connection(transport);

        let intent = StatementIntent::Select(SelectIntent::builder("users").build().unwrap());
        let result = conn.run(&intent).await;
        assert!(matches!(result, Err(CqlError::TypeMismatch(_))));
    }

    #[tokio::test]
    async fn test_execute_schema_rejects_unsupported_before_transport() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let mut conn = connection(transport.clone());

        let result = conn
            .execute_schema(&SchemaStatement::RenameTable {
                from: "a".to_string(),
                to: "b".to_string(),
            })
            .await;

        assert!(matches!(result, Err(CqlError::UnsupportedFeature(_))));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_offset_select_never_reaches_the_transport() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let conn = connection(transport.clone());

        let intent = SelectIntent::builder("users").offset(10).build().unwrap();
        let result = conn.run_select(&intent).await;

        assert!(matches!(result, Err(CqlError::UnsupportedFeature(_))));
        assert_eq!(transport.call_count(), 0);
    }
}
