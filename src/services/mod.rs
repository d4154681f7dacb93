pub mod completion;
pub mod knowledge_service;
pub mod link_service;
pub mod notifier;
pub mod optimistic;
pub mod project_service;
pub mod reflection_service;
pub mod reorder;
pub mod session;
pub mod settings_service;
pub mod state;
pub mod task_service;
pub mod tracker_service;
