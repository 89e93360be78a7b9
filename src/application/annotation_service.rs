// Annotation service - favourites, priorities and custom stations, saved on every change
use crate::application::annotation_storage::AnnotationStorage;
use crate::application::clock::Clock;
use crate::domain::annotations::{
    CustomStation, CustomStationDraft, CustomStationPatch, InvalidCustomStation, PriorityLevel,
    UserAnnotations,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedAnnotationService = Arc<Mutex<AnnotationService>>;

pub struct AnnotationService {
    annotations: UserAnnotations,
    storage: Arc<dyn AnnotationStorage>,
    clock: Arc<dyn Clock>,
    next_suffix: u64,
}

impl AnnotationService {
    pub fn new(storage: Arc<dyn AnnotationStorage>, clock: Arc<dyn Clock>) -> Self {
        let annotations = match storage.load() {
            Ok(loaded) => loaded.unwrap_or_default(),
            Err(e) => {
                tracing::error!("Error loading user annotations, starting empty: {}", e);
                UserAnnotations::default()
            }
        };

        Self {
            annotations,
            storage,
            clock,
            next_suffix: 0,
        }
    }

    pub fn favorites(&self) -> &[String] {
        &self.annotations.favorites
    }

    pub fn toggle_favorite(&mut self, station_id: &str) -> bool {
        let favorite = self.annotations.toggle_favorite(station_id);
        self.persist();
        favorite
    }

    pub fn priorities(&self) -> &BTreeMap<String, PriorityLevel> {
        &self.annotations.priorities
    }

    pub fn set_priority(&mut self, station_id: &str, level: PriorityLevel) {
        self.annotations.set_priority(station_id, level);
        self.persist();
    }

    pub fn custom_stations(&self) -> &[CustomStation] {
        &self.annotations.custom_stations
    }

    pub fn add_custom_station(
        &mut self,
        draft: CustomStationDraft,
    ) -> Result<CustomStation, InvalidCustomStation> {
        draft.validate()?;
        let now_ms = self.clock.now_ms();
        let id = self.fresh_id(now_ms);
        let station = draft.into_station(id, now_ms);

        self.annotations.custom_stations.push(station.clone());
        self.persist();
        Ok(station)
    }

    /// `Ok(None)` when no custom station has that id.
    pub fn update_custom_station(
        &mut self,
        id: &str,
        patch: CustomStationPatch,
    ) -> Result<Option<CustomStation>, InvalidCustomStation> {
        patch.validate()?;
        let updated = self.annotations.update_custom_station(id, patch).cloned();
        if updated.is_some() {
            self.persist();
        }
        Ok(updated)
    }

    pub fn delete_custom_station(&mut self, id: &str) -> bool {
        let deleted = self.annotations.delete_custom_station(id);
        if deleted {
            self.persist();
        }
        deleted
    }

    pub fn clear_custom_stations(&mut self) {
        self.annotations.custom_stations.clear();
        self.persist();
    }

    fn fresh_id(&mut self, now_ms: i64) -> String {
        loop {
            let id = format!("custom_{}_{}", now_ms, self.next_suffix);
            self.next_suffix += 1;
            if self.annotations.custom_station(&id).is_none() {
                return id;
            }
        }
    }

    /// Best effort, like the history store: failures are logged only.
    fn persist(&self) {
        if let Err(e) = self.storage.save(&self.annotations) {
            tracing::error!("Error saving user annotations: {}", e);
        }
    }
}
