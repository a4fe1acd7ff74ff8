pub mod app;
pub mod debounce;
pub mod input;
pub mod render;
pub mod settings;
