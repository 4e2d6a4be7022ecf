pub mod compiler;
pub mod intent;

pub use compiler::{CompiledStatement, QueryCompiler};
pub use intent::{
    Aggregate, AggregateFn, CollectionKind, CollectionMutation, CollectionOp, DeleteBuilder,
    DeleteIntent, InsertBuilder, InsertIntent, Predicate, PredicateOp, SelectBuilder,
    SelectIntent, SortOrder, StatementIntent, UpdateBuilder, UpdateIntent,
};
