//! Customer segmentation: rule evaluation, the segment builder, computed
//! member statistics, and the segment manager that freezes rule matches
//! into snapshots.

pub mod builder;
pub mod computed;
pub mod engine;
pub mod predicates;

pub use builder::SegmentBuilder;
pub use computed::SegmentMember;
pub use engine::{
    CreateSegmentRequest, CreatedSegment, SegmentManager, SegmentMembers, SegmentSummary,
};
