mod config;
mod constants;
mod data;
mod error;
pub mod parse;
mod rpc;
pub mod timestamp;

pub use config::*;
pub use constants::*;
pub use data::*;
pub use error::*;
pub use rpc::*;
