pub mod dns;
pub mod keys;
