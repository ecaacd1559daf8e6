// TabMosaic state managers
// Managers own mutable state: the tab snapshot, the selection cursor and the
// overview window lifecycle.

pub mod selection;
pub mod tab_registry;
pub mod window_lifecycle;
