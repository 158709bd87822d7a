use crm_core::store::{CampaignQuery, CampaignStore};
use crm_core::types::Campaign;
use crm_core::{CrmError, CrmResult};
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryCampaignStore {
    campaigns: DashMap<Uuid, Campaign>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CampaignStore for InMemoryCampaignStore {
    fn insert(&self, campaign: Campaign) -> CrmResult<()> {
        self.campaigns.insert(campaign.id, campaign);
        Ok(())
    }

    fn get(&self, id: Uuid) -> CrmResult<Option<Campaign>> {
        Ok(self.campaigns.get(&id).map(|r| r.value().clone()))
    }

    fn save(&self, campaign: &Campaign) -> CrmResult<()> {
        match self.campaigns.get_mut(&campaign.id) {
            Some(mut entry) => {
                *entry.value_mut() = campaign.clone();
                Ok(())
            }
            None => Err(CrmError::not_found("Campaign", campaign.id)),
        }
    }

    fn query(&self, query: &CampaignQuery) -> CrmResult<(Vec<Campaign>, u64)> {
        let mut matched: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|r| query.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok((page, total))
    }
}
