use std::sync::Arc;

use crate::core::config::Settings;
use crate::repositories::ContentStore;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    store: Arc<dyn ContentStore>,
}

impl AppState {
    pub(crate) fn new(settings: Settings, store: Arc<dyn ContentStore>) -> Self {
        Self { inner: Arc::new(InnerState { settings, store }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn store(&self) -> &dyn ContentStore {
        self.inner.store.as_ref()
    }
}
