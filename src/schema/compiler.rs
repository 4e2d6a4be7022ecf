use crate::config::ReplicationMap;
use crate::errors::CqlError;
use crate::ident;
use crate::query::intent::SortOrder;

use super::table::{ColumnDefinition, TableDefinition};

/// A data-definition statement to compile. Variants the dialect cannot
/// express are rejected before any text is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaStatement {
    CreateTable(TableDefinition),
    AlterTableAdd {
        table: String,
        columns: Vec<ColumnDefinition>,
    },
    AlterTableDrop {
        table: String,
        columns: Vec<String>,
    },
    AlterTableAlterType {
        table: String,
        column: ColumnDefinition,
    },
    DropTable {
        table: String,
        if_exists: bool,
    },
    CreateIndex {
        table: String,
        name: String,
        columns: Vec<String>,
    },
    DropIndex {
        name: String,
    },
    CreateKeyspace {
        name: String,
        replication: Option<ReplicationMap>,
        if_not_exists: bool,
    },
    DropKeyspaceIfExists {
        name: String,
    },
    RenameTable {
        from: String,
        to: String,
    },
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    RenameIndex {
        from: String,
        to: String,
    },
}

/// Ordered column modifiers, evaluated uniformly for every column.
const COLUMN_MODIFIERS: &[fn(&ColumnDefinition) -> Option<&'static str>] = &[
    |column| column.primary_key.then_some(" primary key"),
    |column| column.is_static.then_some(" static"),
];

/// Compiles table and keyspace DDL into dialect text.
#[derive(Debug, Clone, Default)]
pub struct SchemaCompiler {
    keyspace: Option<String>,
    table_prefix: String,
    default_replication: Option<ReplicationMap>,
}

impl SchemaCompiler {
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

    pub fn with_default_replication(mut self, replication: ReplicationMap) -> Self {
        self.default_replication = Some(replication);
        self
    }

    pub fn compile(&self, statement: &SchemaStatement) -> Result<String, CqlError> {
        match statement {
            SchemaStatement::CreateTable(definition) => self.compile_create_table(definition),
            SchemaStatement::AlterTableAdd { table, columns } => {
                let additions = columns
                    .iter()
                    .map(|column| Ok(format!("add {}", self.render_column(column)?)))
                    .collect::<Result<Vec<_>, CqlError>>()?;
                Ok(format!(
                    "alter table {} {}",
                    self.wrap_table(table),
                    additions.join(", ")
                ))
            }
            SchemaStatement::AlterTableDrop { table, columns } => {
                let drops: Vec<String> = columns
                    .iter()
                    .map(|column| format!("drop {}", ident::wrap_value(column)))
                    .collect();
                Ok(format!(
                    "alter table {} {}",
                    self.wrap_table(table),
                    drops.join(", ")
                ))
            }
            SchemaStatement::AlterTableAlterType { table, column } => Ok(format!(
                "alter table {} alter column {}",
                self.wrap_table(table),
                self.render_column(column)?
            )),
            SchemaStatement::DropTable { table, if_exists } => Ok(format!(
                "drop table {}{}",
                if *if_exists { "if exists " } else { "" },
                self.wrap_table(table)
            )),
            SchemaStatement::CreateIndex {
                table,
                name,
                columns,
            } => Ok(format!(
                "create index {} on {} ({})",
                ident::wrap_value(name),
                self.wrap_table(table),
                ident::columnize(columns)
            )),
            SchemaStatement::DropIndex { name } => {
                Ok(format!("drop index {}", ident::wrap_value(name)))
            }
            SchemaStatement::CreateKeyspace {
                name,
                replication,
                if_not_exists,
            } => self.compile_create_keyspace(name, replication.as_ref(), *if_not_exists),
            SchemaStatement::DropKeyspaceIfExists { name } => {
                Ok(self.compile_drop_keyspace_if_exists(name))
            }
            SchemaStatement::RenameTable { .. } => Err(CqlError::UnsupportedFeature(
                "this dialect does not support renaming tables".to_string(),
            )),
            SchemaStatement::RenameColumn { .. } => Err(CqlError::UnsupportedFeature(
                "this dialect does not support renaming columns".to_string(),
            )),
            SchemaStatement::RenameIndex { .. } => Err(CqlError::UnsupportedFeature(
                "this dialect does not support renaming indexes".to_string(),
            )),
        }
    }

    /// Column list, then one `primary key` clause with the partition group
    /// parenthesized first and clustering columns in declared order. A
    /// clustering-order clause is emitted iff clustering columns exist.
    pub fn compile_create_table(&self, definition: &TableDefinition) -> Result<String, CqlError> {
        if definition.partition_key.is_empty() {
            return Err(CqlError::MalformedStatement(
                "partition key must be defined".to_string(),
            ));
        }

        let mut structure = Vec::with_capacity(definition.columns.len() + 1);
        for column in &definition.columns {
            structure.push(self.render_column(column)?);
        }

        let partition = format!("({})", ident::columnize(&definition.partition_key));
        let (key_cql, clustering_order) = if definition.clustering.is_empty() {
            (partition, String::new())
        } else {
            let names: Vec<&str> = definition
                .clustering
                .iter()
                .map(|(name, _)| name.as_str())
                .collect();
            let orders: Vec<String> = definition
                .clustering
                .iter()
                .map(|(name, order)| {
                    let direction = match order {
                        SortOrder::Asc => "ASC",
                        SortOrder::Desc => "DESC",
                    };
                    format!("{} {}", ident::wrap_value(name), direction)
                })
                .collect();
            (
                format!("{}, {}", partition, ident::columnize(&names)),
                format!(" WITH CLUSTERING ORDER BY ({})", orders.join(", ")),
            )
        };
        structure.push(format!("primary key ({})", key_cql));

        Ok(format!(
            "create table {}{} ({}){}",
            if definition.if_not_exists {
                "if not exists "
            } else {
                ""
            },
            self.wrap_table(&definition.name),
            structure.join(", "),
            clustering_order
        ))
    }

    /// Keyspace creation renders the caller's replication map, falling back
    /// to the configured default, then to SimpleStrategy with factor 1.
    pub fn compile_create_keyspace(
        &self,
        name: &str,
        replication: Option<&ReplicationMap>,
        if_not_exists: bool,
    ) -> Result<String, CqlError> {
        let fallback;
        let replication = match replication.or(self.default_replication.as_ref()) {
            Some(map) => map,
            None => {
                fallback = Self::simple_replication();
                &fallback
            }
        };

        let mut options = Vec::with_capacity(replication.len());
        for (key, value) in replication {
            options.push(format!(
                "'{}': {}",
                key,
                Self::render_replication_value(value)?
            ));
        }

        Ok(format!(
            "create keyspace {}{} with replication = {{{}}}",
            if if_not_exists { "if not exists " } else { "" },
            ident::wrap_value(name),
            options.join(", ")
        ))
    }

    pub fn compile_drop_keyspace_if_exists(&self, name: &str) -> String {
        format!("drop keyspace if exists {}", ident::wrap_value(name))
    }

    pub fn compile_foreign_key(&self) -> Result<String, CqlError> {
        Err(CqlError::UnsupportedFeature(
            "this dialect does not support foreign key creation".to_string(),
        ))
    }

    pub fn compile_enable_foreign_key_constraints(&self) -> Result<String, CqlError> {
        self.compile_foreign_key()
    }

    pub fn compile_disable_foreign_key_constraints(&self) -> Result<String, CqlError> {
        self.compile_foreign_key()
    }

    /// Introspection text for the tables of a keyspace.
    pub fn compile_tables(&self, keyspace: &str) -> String {
        format!(
            "select table_name as name, comment from system_schema.tables \
             where keyspace_name = {} order by table_name",
            ident::quote_string(keyspace)
        )
    }

    pub fn compile_columns(&self, keyspace: &str, table: &str) -> String {
        format!(
            "select column_name as name, type, kind, clustering_order, position \
             from system_schema.columns where keyspace_name = {} and table_name = {} \
             order by column_name",
            ident::quote_string(keyspace),
            ident::quote_string(table)
        )
    }

    pub fn compile_keyspaces(&self) -> String {
        "select keyspace_name as name, replication, durable_writes from system_schema.keyspaces"
            .to_string()
    }

    pub fn compile_indexes(&self, keyspace: &str, table: &str) -> String {
        format!(
            "select index_name as name, kind as type, options from system_schema.indexes \
             where keyspace_name = {} and table_name = {}",
            ident::quote_string(keyspace),
            ident::quote_string(table)
        )
    }

    pub fn compile_views(&self, keyspace: &str) -> String {
        format!(
            "select view_name as name, base_table_name, where_clause, comment \
             from system_schema.views where keyspace_name = {}",
            ident::quote_string(keyspace)
        )
    }

    fn render_column(&self, column: &ColumnDefinition) -> Result<String, CqlError> {
        let mut rendered = format!(
            "{} {}",
            ident::wrap_value(&column.name),
            column.ty.as_cql()?
        );
        for modifier in COLUMN_MODIFIERS {
            if let Some(suffix) = modifier(column) {
                rendered.push_str(suffix);
            }
        }
        Ok(rendered)
    }

    fn wrap_table(&self, table: &str) -> String {
        let table = ident::wrap_value(&format!("{}{}", self.table_prefix, table));
        match &self.keyspace {
            Some(keyspace) => format!("{}.{}", ident::wrap_value(keyspace), table),
            None => table,
        }
    }

    fn simple_replication() -> ReplicationMap {
        let mut map = ReplicationMap::new();
        map.insert(
            "class".to_string(),
            serde_json::Value::String("SimpleStrategy".to_string()),
        );
        map.insert("replication_factor".to_string(), serde_json::json!(1));
        map
    }

    fn render_replication_value(value: &serde_json::Value) -> Result<String, CqlError> {
        match value {
            serde_json::Value::String(s) => Ok(ident::quote_string(s)),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            serde_json::Value::Bool(b) => Ok(b.to_string()),
            _ => Err(CqlError::ConfigError(
                "replication options must be scalar values".to_string(),
            )),
        }
    }
}
