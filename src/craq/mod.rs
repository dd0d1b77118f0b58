//! Chain Replication with Apportioned Queries.

mod replica;
mod store;

pub use replica::CraqReplica;
pub use store::{ReadOutcome, VersionedStore};
