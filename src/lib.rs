pub mod config;
pub mod fetcher;
pub mod fingerprint;
pub mod ingest;
pub mod platform;
pub mod publish;
pub mod sources;
pub mod store;
pub mod types;

pub use config::{FetchConfig, LabelIds, PlatformConfig, PublishConfig, RelayConfig, SourceSpec};
pub use fetcher::Fetcher;
pub use fingerprint::fingerprint;
pub use ingest::{IngestConfig, IngestOrchestrator};
pub use platform::{PlatformCredentials, PostHandle, PublishPlatform, RestPlatform};
pub use publish::{BlockList, PublishDriver, PublishSelector};
pub use sources::{SourceAdapter, SourceRegistry};
pub use store::{EntryStore, NewEntry};
pub use types::*;
