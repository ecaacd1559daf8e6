// TabMosaic services
// Services hold the algorithms: preview discovery, capture scheduling, layout,
// settings persistence and the small utilities they share.

pub mod capture_scheduler;
pub mod debounce;
pub mod image_fetcher;
pub mod placeholder;
pub mod preview_resolver;
pub mod settings_engine;
pub mod thumbnail_cache;
pub mod tile_layout;
pub mod visibility;
