pub mod reflection_repository;
pub mod settings_repository;
