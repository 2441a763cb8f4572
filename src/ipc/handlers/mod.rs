pub mod attendance;
pub mod backup;
pub mod core;
pub mod links;
pub mod settings;
pub mod students;
