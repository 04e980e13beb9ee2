/*
[INPUT]:  HTTP client configuration and the login endpoint
[OUTPUT]: Typed login exchange results
[POS]:    HTTP layer - REST communication with the session backend
[UPDATE]: When adding endpoints or changing client behavior
*/

pub mod client;
pub mod error;

pub use client::{ClientConfig, LoginClient};
pub use error::{LinkError, Result};
