pub mod chat;
pub mod input;
pub mod json_panel;
pub mod sessions;
pub mod status;
