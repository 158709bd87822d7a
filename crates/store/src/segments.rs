use crm_core::store::SegmentStore;
use crm_core::types::Segment;
use crm_core::CrmResult;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemorySegmentStore {
    segments: DashMap<Uuid, Segment>,
}

impl InMemorySegmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SegmentStore for InMemorySegmentStore {
    fn insert(&self, segment: Segment) -> CrmResult<()> {
        self.segments.insert(segment.id, segment);
        Ok(())
    }

    fn get(&self, id: Uuid) -> CrmResult<Option<Segment>> {
        Ok(self.segments.get(&id).map(|r| r.value().clone()))
    }

    fn list(&self) -> CrmResult<Vec<Segment>> {
        let mut segments: Vec<Segment> = self.segments.iter().map(|r| r.value().clone()).collect();
        segments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(segments)
    }
}
