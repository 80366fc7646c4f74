pub mod bind_format;
pub mod loader;

pub use loader::BindKeyLoader;
