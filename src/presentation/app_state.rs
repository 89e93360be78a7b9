// Application state for HTTP handlers
use crate::application::annotation_service::SharedAnnotationService;
use crate::application::lifecycle::LifecycleController;
use crate::application::station_history_service::SharedHistoryService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<LifecycleController>,
    pub annotations: SharedAnnotationService,
}

impl AppState {
    pub fn history(&self) -> &SharedHistoryService {
        self.controller.service()
    }
}
