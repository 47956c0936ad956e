pub mod client;
pub mod error;
pub mod normalize;
pub(crate) mod retry;
pub mod session;
pub mod store;
pub mod types;

pub use client::AirtableClient;
pub use error::{AirtableError, StoreError};
pub use normalize::normalize_record;
pub use session::{LoadTicket, LocationSession};
pub use store::{DataOrigin, FallbackReason, LoadedLocations, LocationStore};
pub use types::{AirtableRecord, ListRecordsResponse};
