mod builders;
mod dns_server_mock;
mod key_files;

pub use builders::*;
pub use dns_server_mock::*;
pub use key_files::*;
