pub mod api_client;
pub mod cache_service;
pub mod endpoint_service;
pub mod offline_service;
pub mod sync_service;

#[cfg(target_arch = "wasm32")]
pub mod network_monitor;
#[cfg(target_arch = "wasm32")]
pub mod web_cache;

pub use api_client::{ApiClient, HttpReply, HttpTransport, PostReply};
pub use cache_service::{AssetCacheManager, AssetFetcher, CacheBackend};
pub use endpoint_service::EndpointSettings;
pub use offline_service::TransactionQueue;
pub use sync_service::SyncService;

#[cfg(target_arch = "wasm32")]
pub use api_client::GlooTransport;
#[cfg(target_arch = "wasm32")]
pub use network_monitor::{NetworkMonitor, NetworkStatus};
#[cfg(target_arch = "wasm32")]
pub use web_cache::{FetchAssetFetcher, WebCacheBackend};
