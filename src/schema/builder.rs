use crate::config::ReplicationMap;
use crate::connection::{Connection, StatementOptions};
use crate::consistency::ConsistencyLevel;
use crate::errors::CqlError;
use crate::value::CqlValue;

use super::compiler::SchemaStatement;
use super::table::TableDefinition;

/// Compiles schema statements and runs them through a connection.
pub struct SchemaBuilder<'a> {
    connection: &'a mut Connection,
    consistency: Option<ConsistencyLevel>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(connection: &'a mut Connection) -> Self {
        Self {
            connection,
            consistency: None,
        }
    }

    /// Consistency applied to every statement issued by this builder.
    pub fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = Some(level);
        self
    }

    pub async fn create_keyspace(
        &mut self,
        name: &str,
        replication: Option<&ReplicationMap>,
    ) -> Result<bool, CqlError> {
        let cql = self
            .connection
            .schema_compiler()
            .compile_create_keyspace(name, replication, false)?;
        self.run(cql).await
    }

    pub async fn create_keyspace_if_not_exists(
        &mut self,
        name: &str,
        replication: Option<&ReplicationMap>,
    ) -> Result<bool, CqlError> {
        let cql = self
            .connection
            .schema_compiler()
            .compile_create_keyspace(name, replication, true)?;
        self.run(cql).await
    }

    pub async fn drop_keyspace_if_exists(&mut self, name: &str) -> Result<bool, CqlError> {
        let cql = self
            .connection
            .schema_compiler()
            .compile_drop_keyspace_if_exists(name);
        self.run(cql).await
    }

    pub async fn create_table(&mut self, definition: &TableDefinition) -> Result<bool, CqlError> {
        let cql = self
            .connection
            .schema_compiler()
            .compile_create_table(definition)?;
        self.run(cql).await
    }

    pub async fn drop_table(&mut self, table: &str) -> Result<bool, CqlError> {
        self.compile_and_run(&SchemaStatement::DropTable {
            table: table.to_string(),
            if_exists: false,
        })
        .await
    }

    pub async fn drop_table_if_exists(&mut self, table: &str) -> Result<bool, CqlError> {
        self.compile_and_run(&SchemaStatement::DropTable {
            table: table.to_string(),
            if_exists: true,
        })
        .await
    }

    pub async fn create_index(
        &mut self,
        table: &str,
        name: &str,
        columns: &[&str],
    ) -> Result<bool, CqlError> {
        self.compile_and_run(&SchemaStatement::CreateIndex {
            table: table.to_string(),
            name: name.to_string(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
        })
        .await
    }

    pub async fn drop_index(&mut self, name: &str) -> Result<bool, CqlError> {
        self.compile_and_run(&SchemaStatement::DropIndex {
            name: name.to_string(),
        })
        .await
    }

    /// Table names of the connected keyspace, via system_schema.
    pub async fn tables(&mut self) -> Result<Vec<String>, CqlError> {
        let keyspace = self.connection.keyspace();
        if keyspace.is_empty() {
            return Err(CqlError::ConfigError(
                "keyspace is not configured".to_string(),
            ));
        }
        let cql = self.connection.schema_compiler().compile_tables(keyspace);

        let options = StatementOptions {
            consistency: self.consistency,
            ..Default::default()
        };
        let rows = self.connection.select(&cql, &[], &options).await?;
        Ok(rows
            .iter()
            .filter_map(|row| match row.get("name") {
                Some(CqlValue::Text(name)) => Some(name.clone()),
                _ => None,
            })
            .collect())
    }

    pub async fn has_table(&mut self, table: &str) -> Result<bool, CqlError> {
        let target = format!("{}{}", self.connection.table_prefix(), table);
        Ok(self.tables().await?.iter().any(|name| *name == target))
    }

    pub fn rename(&self, _from: &str, _to: &str) -> Result<(), CqlError> {
        Err(CqlError::UnsupportedFeature(
            "this dialect does not support renaming tables".to_string(),
        ))
    }

    pub fn get_foreign_keys(&self, _table: &str) -> Result<Vec<String>, CqlError> {
        Err(CqlError::UnsupportedFeature(
            "this dialect does not support foreign keys".to_string(),
        ))
    }

    async fn compile_and_run(&mut self, statement: &SchemaStatement) -> Result<bool, CqlError> {
        let cql = self.connection.schema_compiler().compile(statement)?;
        self.run(cql).await
    }

    async fn run(&mut self, cql: String) -> Result<bool, CqlError> {
        let options = StatementOptions {
            consistency: self.consistency,
            ..Default::default()
        };
        self.connection.statement(&cql, &[], &options).await
    }
}
