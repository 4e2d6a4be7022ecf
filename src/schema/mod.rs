pub mod builder;
pub mod compiler;
pub mod table;

pub use builder::SchemaBuilder;
pub use compiler::{SchemaCompiler, SchemaStatement};
pub use table::{ColumnDefinition, ColumnType, TableBuilder, TableDefinition};
