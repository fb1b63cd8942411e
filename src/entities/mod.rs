// Entity Models - the four retail relations
//
// Each entity is an immutable reference row keyed by an integer id.
// The analytical layer only ever reads them; rows are created by ingestion.

pub mod customer;
pub mod product;
pub mod transaction;
pub mod snapshot;

pub use customer::{Customer, Region};
pub use product::Product;
pub use transaction::{parse_timestamp, Transaction};
pub use snapshot::Snapshot;
