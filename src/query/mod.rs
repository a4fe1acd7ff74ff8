pub mod encoder;
pub mod template;
