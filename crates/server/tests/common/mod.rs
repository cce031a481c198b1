//! Common test utilities and fixtures.

pub mod fixtures;
pub mod requests;
pub mod server;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use requests::*;
#[allow(unused_imports)]
pub use server::*;
