/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public wallet adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod http;
pub mod provider;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    MAX_EXPIRES_SECONDS,
    MockWalletSigner,
    ProviderSigner,
    SessionBinder,
    SessionSettings,
    SessionStore,
    SignInChallenge,
    SignInOutcome,
    SignedCredential,
    TokenData,
    WalletSigner,
};

// Re-export commonly used types from http
pub use http::{ClientConfig, LinkError, LoginClient, Result};

// Re-export provider boundary
pub use provider::{LocalKeyProvider, ProviderError, ScriptStep, ScriptedProvider, WalletProvider};

// Re-export all types
pub use types::*;
