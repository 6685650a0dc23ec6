pub mod bootstrap;
pub mod handlers;
pub mod responses;

pub use bootstrap::{configure, run};
