#[macro_use]
extern crate serde;

#[macro_use]
extern crate log;

mod ballot;
mod commission;
mod config;
mod crypto;
mod error;
mod random;
mod results;
pub mod rsa_kem;
mod transform;
mod voter;

pub use ballot::*;
pub use commission::*;
pub use config::*;
pub use crypto::*;
pub use error::*;
pub use random::*;
pub use results::*;
pub use transform::*;
pub use voter::*;

#[cfg(test)]
mod testing;
