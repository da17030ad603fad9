//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{ClickRecorder, Resolver};
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::hot_links::HotLinkTracker;

/// Cheap-to-clone handle to the services behind the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub recorder: Arc<ClickRecorder>,
    pub cache: Arc<dyn CacheService>,
    pub hot_links: Arc<dyn HotLinkTracker>,
    pub link_repository: Arc<dyn LinkRepository>,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for the client address.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        resolver: Arc<Resolver>,
        recorder: Arc<ClickRecorder>,
        cache: Arc<dyn CacheService>,
        hot_links: Arc<dyn HotLinkTracker>,
        link_repository: Arc<dyn LinkRepository>,
        behind_proxy: bool,
    ) -> Self {
        Self {
            resolver,
            recorder,
            cache,
            hot_links,
            link_repository,
            behind_proxy,
        }
    }
}
