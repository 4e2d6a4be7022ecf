//! cqlkit - statement compiler and execution core for partition/clustering
//! oriented wide-column stores speaking a CQL dialect.
//!
//! Callers build an immutable statement intent or table definition, hand it
//! to the matching compiler, and run the compiled text through a
//! [`Connection`] backed by an external [`Transport`]. Reads page forward
//! through continuation tokens, eagerly or via a lazy [`RowStream`];
//! consistency is resolved per statement.
//!
//! The dialect has no joins, no offsets and no foreign keys; operations it
//! cannot express fail with [`CqlError::UnsupportedFeature`] before any text
//! is produced or any transport call is made.

pub mod config;
pub mod connection;
pub mod consistency;
pub mod errors;
mod ident;
pub mod query;
pub mod schema;
pub mod transport;
pub mod value;

pub use config::{load_config, ConnectionConfig, NodeConfig, PortSpec, ReplicationMap};
pub use connection::{Connection, PagingState, RowStream, StatementOptions, WarningHandler};
pub use consistency::ConsistencyLevel;
pub use errors::CqlError;
pub use query::{
    Aggregate, AggregateFn, CollectionKind, CollectionMutation, CollectionOp, CompiledStatement,
    DeleteIntent, InsertIntent, Predicate, PredicateOp, QueryCompiler, SelectIntent, SortOrder,
    StatementIntent, UpdateIntent,
};
pub use schema::{
    ColumnDefinition, ColumnType, SchemaBuilder, SchemaCompiler, SchemaStatement, TableBuilder,
    TableDefinition,
};
pub use transport::{CqlResult, ExecuteOptions, Prepared, ResultKind, Row, Transport};
pub use value::CqlValue;
