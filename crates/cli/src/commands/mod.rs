pub mod config_cmd;
pub mod extract;
pub mod history;
pub mod init;
pub mod render;
pub mod status;
