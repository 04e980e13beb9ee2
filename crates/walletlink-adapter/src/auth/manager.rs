/*
[INPUT]:  Connected wallet signer and login HTTP client
[OUTPUT]: Session token bound to the wallet address
[POS]:    Auth layer - orchestrates the sign-in exchange
[UPDATE]: When the login endpoint or flow steps change
*/

use tracing::{debug, info, warn};

use crate::http::{LoginClient, Result};
use crate::types::{LoginRequest, LoginResponse};

use super::{SessionStore, SignInChallenge, WalletSigner};

pub const DEFAULT_EXPIRES_SECONDS: u64 = 7 * 24 * 60 * 60;
/// Longest session lifetime a configuration may ask for (one year)
pub const MAX_EXPIRES_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Static parameters of the sign-in exchange
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub domain: String,
    pub uri: String,
    pub statement: String,
    /// Platform identifier forwarded with the login request
    pub platform: String,
    pub expires_seconds: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            uri: "http://localhost".to_string(),
            statement: "Sign in with Ethereum to the app.".to_string(),
            platform: "user".to_string(),
            expires_seconds: DEFAULT_EXPIRES_SECONDS,
        }
    }
}

/// Address plus signature-derived credential produced by a wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCredential {
    pub address: String,
    pub message: String,
    pub signature: String,
}

/// Result of a bind attempt that reached a conclusion
#[derive(Debug, Clone, PartialEq)]
pub enum SignInOutcome {
    /// A valid session already existed; nothing was signed
    AlreadyBound,
    /// New session token stored for the address
    Established { address: String, token: String },
    /// Backend answered with a non-success code; no session stored
    Rejected { code: i64, message: Option<String> },
}

/// Manages the sign-in exchange
#[derive(Debug)]
pub struct SessionBinder {
    client: LoginClient,
    sessions: SessionStore,
    settings: SessionSettings,
}

impl SessionBinder {
    pub fn new(client: LoginClient, settings: SessionSettings) -> Self {
        Self::with_store(client, SessionStore::new(), settings)
    }

    /// Share an existing token store
    pub fn with_store(client: LoginClient, sessions: SessionStore, settings: SessionSettings) -> Self {
        Self {
            client,
            sessions,
            settings,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Step 1: build the challenge and have the wallet sign it
    pub async fn sign_in(&self, wallet: &dyn WalletSigner) -> Result<SignedCredential> {
        let address = wallet.address().to_string();
        let message = SignInChallenge::new(
            &self.settings.domain,
            &self.settings.uri,
            &address,
            wallet.chain_id(),
        )
        .with_statement(self.settings.statement.clone())
        .to_message();

        debug!(%address, "requesting sign-in signature");
        let signature = wallet.sign_message(&message).await?;

        Ok(SignedCredential {
            address,
            message,
            signature,
        })
    }

    /// Step 2: exchange the credential, tagged with the platform, for a token
    pub async fn login(&self, credential: &SignedCredential) -> Result<LoginResponse> {
        let request = LoginRequest {
            address: credential.address.clone(),
            message: credential.message.clone(),
            signature: credential.signature.clone(),
            platform: self.settings.platform.clone(),
        };
        self.client.login(&request).await
    }

    /// Complete flow
    ///
    /// 1. Skip when a valid session exists for the address
    /// 2. Sign the challenge
    /// 3. Login
    /// 4. Store the token on success
    pub async fn bind(&self, wallet: &dyn WalletSigner) -> Result<SignInOutcome> {
        let address = wallet.address();
        if self.sessions.has_valid_session(address) {
            debug!(%address, "session already bound");
            return Ok(SignInOutcome::AlreadyBound);
        }

        let credential = self.sign_in(wallet).await?;
        let response = self.login(&credential).await?;

        let Some(token) = response.access_token().map(str::to_string) else {
            warn!(%address, code = response.code, "login exchange did not establish a session");
            return Ok(SignInOutcome::Rejected {
                code: response.code,
                message: response.message,
            });
        };

        let profile = response.data.map(|data| data.profile).unwrap_or_default();
        self.sessions
            .set_token(&credential.address, token.clone(), self.settings.expires_seconds, profile);
        info!(address = %credential.address, "session established");

        Ok(SignInOutcome::Established {
            address: credential.address,
            token,
        })
    }

    /// Forget the session bound to an address
    pub fn sign_out(&self, address: &str) {
        if self.sessions.remove(address).is_some() {
            info!(%address, "session cleared");
        }
    }
}

impl SignInOutcome {
    pub fn is_established(&self) -> bool {
        matches!(self, SignInOutcome::Established { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::MockWalletSigner;
    use crate::http::LinkError;

    fn binder_for(server: &MockServer) -> SessionBinder {
        let client = LoginClient::new(&format!("{}/api/auth/login", server.uri())).unwrap();
        SessionBinder::new(client, SessionSettings::default())
    }

    #[tokio::test]
    async fn test_bind_happy_path_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_partial_json(serde_json::json!({
                "address": "0xabc",
                "signature": "0xsig",
                "platform": "user",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "data": {"accessToken": "jwt-token", "nickname": "gamer"},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let binder = binder_for(&server);
        let wallet = MockWalletSigner::new(137, "0xabc", "0xsig");

        let outcome = binder.bind(&wallet).await.unwrap();
        assert_eq!(
            outcome,
            SignInOutcome::Established {
                address: "0xabc".to_string(),
                token: "jwt-token".to_string(),
            }
        );
        assert_eq!(binder.sessions().get_token("0xABC"), Some("jwt-token".to_string()));
        let data = binder.sessions().token_data("0xabc").unwrap();
        assert_eq!(data.profile.get("nickname").and_then(|v| v.as_str()), Some("gamer"));
    }

    #[tokio::test]
    async fn test_bind_skips_when_session_exists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let binder = binder_for(&server);
        binder
            .sessions()
            .set_token("0xabc", "existing".to_string(), 3600, Default::default());
        let wallet = MockWalletSigner::new(137, "0xabc", "0xsig");

        assert_eq!(binder.bind(&wallet).await.unwrap(), SignInOutcome::AlreadyBound);
    }

    #[tokio::test]
    async fn test_bind_non_success_code_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 401,
                "message": "signature mismatch",
            })))
            .mount(&server)
            .await;

        let binder = binder_for(&server);
        let wallet = MockWalletSigner::new(137, "0xabc", "0xsig");

        let outcome = binder.bind(&wallet).await.unwrap();
        assert_eq!(
            outcome,
            SignInOutcome::Rejected {
                code: 401,
                message: Some("signature mismatch".to_string()),
            }
        );
        assert!(!binder.sessions().has_valid_session("0xabc"));
    }

    #[tokio::test]
    async fn test_bind_propagates_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let binder = binder_for(&server);
        let wallet = MockWalletSigner::new(137, "0xabc", "0xsig");

        assert!(matches!(
            binder.bind(&wallet).await,
            Err(LinkError::Api { code: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_sign_in_embeds_address_and_chain() {
        let server = MockServer::start().await;
        let binder = binder_for(&server);
        let wallet = MockWalletSigner::new(59144, "0xabc", "0xsig");

        let credential = binder.sign_in(&wallet).await.unwrap();
        assert_eq!(credential.address, "0xabc");
        assert_eq!(credential.signature, "0xsig");
        assert!(credential.message.contains("\n0xabc\n"));
        assert!(credential.message.contains("Chain ID: 59144"));
    }

    #[test]
    fn test_sign_out_clears_session() {
        let client = LoginClient::new("http://localhost/login").unwrap();
        let binder = SessionBinder::new(client, SessionSettings::default());
        binder
            .sessions()
            .set_token("0xabc", "t".to_string(), 3600, Default::default());

        binder.sign_out("0xABC");
        assert!(!binder.sessions().has_valid_session("0xabc"));
    }
}
