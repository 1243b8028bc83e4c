pub mod chat;
pub mod delete;
pub mod history;
pub mod init;
pub mod optimize;
