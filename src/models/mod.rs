pub mod knowledge;
pub mod notice;
pub mod project;
pub mod reflection;
pub mod settings;
pub mod task;
pub mod tracker;
