pub mod analysis;
pub mod audio;
pub mod chat;
pub mod init;
pub mod video;
