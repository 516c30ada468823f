//! Explicitly constructed owner of a scene, its audio and the readers over
//! them. Each [`Session`] is independent; wrap one in a [`SharedSession`] to
//! use it from several threads.

pub mod config;
pub mod error;
pub mod session;

pub use config::SessionConfig;
pub use error::SessionError;
pub use session::{Session, SharedSession};
