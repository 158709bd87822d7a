//! Shared domain model for the CRM campaign backend: customers, segments,
//! campaigns, message logs, the customer filter language, the store seams
//! and configuration.

pub mod config;
pub mod error;
pub mod filter;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use error::{CrmError, CrmResult, ErrorKind};
pub use filter::{Comparison, CustomerFilter, FieldCondition};
