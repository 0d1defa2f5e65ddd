pub mod init;
pub mod plan;
pub mod preview;
pub mod validate;
