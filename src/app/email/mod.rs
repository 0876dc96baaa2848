pub mod composer;
pub mod template;
pub mod transport;
