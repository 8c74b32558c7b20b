//! Metadata Store Gateway: row-level CRUD and partition delete over a
//! `(owner, prefix)`-keyed table (spec.md §4). Backed by Postgres via sqlx,
//! reusing the teacher's repository-over-`PgPool` idiom.

pub mod metadata_store;
pub mod transaction;

pub use metadata_store::{MetadataStore, PostgresMetadataStore};
pub use transaction::{with_transaction, TransactionGuard};
