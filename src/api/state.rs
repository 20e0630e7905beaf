use crate::application::JarvisService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: JarvisService,
}

impl AppState {
    pub fn new(service: JarvisService) -> Self {
        Self { service }
    }
}
