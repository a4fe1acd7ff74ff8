pub mod init;
pub mod levels;
pub mod select;
pub mod status;
pub mod tree;
pub mod view;
