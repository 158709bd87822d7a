//! In-memory stores backed by DashMap.
//!
//! Production: back the same traits with a document database. These
//! implementations provide the identical API surface for development and tests.

pub mod campaigns;
pub mod customers;
pub mod message_logs;
pub mod segments;

pub use campaigns::InMemoryCampaignStore;
pub use customers::InMemoryCustomerStore;
pub use message_logs::InMemoryMessageLogStore;
pub use segments::InMemorySegmentStore;
