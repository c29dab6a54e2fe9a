pub mod app;
pub mod logging;
pub mod menu;
pub mod progress;
pub mod settings;
pub mod table;
