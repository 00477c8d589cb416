use std::sync::Arc;

use tracing::debug;

use crate::error::DomainResult;
use crate::repository::{LiveStateRepository, TagHistoryRepository};
use crate::tag::ActiveTag;

/// Read side: current live tags and per-tag trail reconstruction.
pub struct QueryService {
    live: Arc<dyn LiveStateRepository>,
    history: Arc<dyn TagHistoryRepository>,
}

impl QueryService {
    pub fn new(live: Arc<dyn LiveStateRepository>, history: Arc<dyn TagHistoryRepository>) -> Self {
        Self { live, history }
    }

    /// Every tag with a non-expired live state.
    ///
    /// A tag can expire between listing the IDs and fetching its state; such
    /// tags are silently dropped rather than surfaced as partial records.
    pub async fn list_active_tags(&self) -> DomainResult<Vec<ActiveTag>> {
        let tag_ids = self.live.list_live_tag_ids().await?;
        let mut tags = Vec::with_capacity(tag_ids.len());
        for tag_id in tag_ids {
            match self.live.get_live_state(&tag_id).await? {
                Some(state) => tags.push(ActiveTag { tag_id, state }),
                None => {
                    debug!(tag_id = %tag_id, "live state expired between list and fetch");
                }
            }
        }
        Ok(tags)
    }

    /// Reconstructs a tag's trail from its history log as an ordered sequence
    /// of (lng, lat) pairs — longitude first, per geospatial path convention.
    ///
    /// Entries without a finite numeric position are dropped; `None` when no
    /// valid positions remain.
    pub async fn get_trail(&self, tag_id: &str) -> DomainResult<Option<Vec<(f64, f64)>>> {
        let entries = self.history.read_all(tag_id).await?;
        let coordinates: Vec<(f64, f64)> = entries
            .iter()
            .filter(|entry| entry.lat.is_finite() && entry.lng.is_finite())
            .map(|entry| (entry.lng, entry.lat))
            .collect();

        if coordinates.is_empty() {
            debug!(tag_id = %tag_id, "no valid trail positions");
            return Ok(None);
        }
        Ok(Some(coordinates))
    }
}
