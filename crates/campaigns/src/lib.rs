//! Campaign engine: draft/start lifecycle, message log fan-out and delivery
//! progress reporting.

pub mod engine;
pub mod ledger;
pub mod lifecycle;
pub mod progress;

pub use engine::{
    CampaignEngine, CampaignListing, CampaignPage, CreateCampaignRequest, ListCampaignsQuery,
    Pagination, SegmentRef, StartedCampaign,
};
pub use ledger::{CampaignMessageLog, MessageLogLedger, Recipient};
pub use lifecycle::CampaignOutcome;
pub use progress::{delivered_percentage, ProgressReport};
