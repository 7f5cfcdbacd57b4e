//! HTTP service and CLI around the `tagdraw` core: configuration, comment storage, Instagram
//! sync and the REST API consumed by the dashboard.

pub mod api;
pub mod config;
pub mod pick;
pub mod render;
pub mod storage;
pub mod sync;
