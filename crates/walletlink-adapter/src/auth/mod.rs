/*
[INPUT]:  Connected wallet, login client and session settings
[OUTPUT]: Session tokens, sign-in challenges and signer adapters
[POS]:    Auth layer - the session binder boundary
[UPDATE]: When the sign-in flow or signer kinds change
*/

pub mod manager;
pub mod session;
pub mod siwe;
pub mod wallet;

pub use manager::{
    DEFAULT_EXPIRES_SECONDS, MAX_EXPIRES_SECONDS, SessionBinder, SessionSettings, SignInOutcome,
    SignedCredential,
};
pub use session::{SessionStore, TokenData};
pub use siwe::SignInChallenge;
pub use wallet::{MockWalletSigner, ProviderSigner, WalletSigner};
