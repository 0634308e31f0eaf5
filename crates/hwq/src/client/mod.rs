pub mod commands;
pub mod context;
pub mod globalsettings;
pub mod output;
