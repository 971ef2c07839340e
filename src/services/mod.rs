//! Business logic behind the HTTP and websocket surfaces.

pub mod answer_service;
pub mod broadcast;
pub mod documentation;
pub mod health_service;
pub mod lifecycle_service;
pub mod quiz_service;
pub mod storage_supervisor;
pub mod websocket_service;
