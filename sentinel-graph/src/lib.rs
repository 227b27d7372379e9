//! Knowledge-graph store: entities and typed relations extracted from case
//! artifacts, deduplicated per case and queryable by the gateway's read
//! endpoints. [`GraphStore`] is the fixed contract; [`MemoryGraphStore`]
//! backs tests and [`TypeDbGraphStore`] backs production via TypeDB.

pub mod adapter;
pub mod service;
pub mod store;
pub mod transactions;

pub use adapter::TypeDBAdapter;
pub use service::TypeDBDriverFactory;
pub use store::{GraphStore, GraphQueryResult, MemoryGraphStore, TypeDbGraphStore};
pub use transactions::{execute_typedb_query, load_schema_from_file, TransactionType};
