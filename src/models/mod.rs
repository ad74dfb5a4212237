pub mod cache;
pub mod product;
pub mod sync;
pub mod transaction;

pub use cache::{ActivationReport, AssetRequest, CacheLifecycle, CacheManifest, CachedResponse, ServedResponse};
pub use product::Product;
pub use sync::{ConnectionState, DrainOutcome, RemoteReply, SubmitOutcome, SyncStatus, TickOutcome};
pub use transaction::{Payload, PendingTransaction, QueueState, TransactionAction, TransactionPayload};
