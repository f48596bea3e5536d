//! Clients for the cloud controller, and its identity provider.
//!
//! Every capability is a separate trait, so that callers (and tests) can swap them
//! individually. All requests of a client are routed through a [`Curler`], which injects
//! the [`AccessToken`] handed in by the caller.

mod apps;
mod bind;
mod curl;
mod drains;
mod error;
mod page;
mod token;

pub use apps::*;
pub use bind::*;
pub use curl::*;
pub use drains::*;
pub use error::*;
pub use token::*;
