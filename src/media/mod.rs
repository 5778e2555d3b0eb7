pub mod mimetype;
pub mod runner;
pub mod transcoder;
