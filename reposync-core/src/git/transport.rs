//! Transport configuration shared by clone and fetch

use git2::{Cred, CredentialType, FetchOptions, RemoteCallbacks};
use tracing::trace;

/// How many times libgit2 may ask for credentials before we give up
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// Authentication settings handed to the git transport
#[derive(Clone, Default)]
pub struct TransportOptions {
    /// Username for HTTPS basic auth (defaults to the one in the URL, then "git")
    pub username: Option<String>,
    /// Token or password for HTTPS basic auth
    pub token: Option<String>,
}

impl std::fmt::Debug for TransportOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportOptions")
            .field("username", &self.username)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl TransportOptions {
    /// Create options with a token (and optional username)
    pub fn with_token(username: Option<String>, token: impl Into<String>) -> Self {
        Self {
            username,
            token: Some(token.into()),
        }
    }

    /// Build the remote callbacks carrying credentials and progress logging
    pub fn remote_callbacks(&self) -> RemoteCallbacks<'static> {
        let username = self.username.clone();
        let token = self.token.clone();
        let helper_config = git2::Config::open_default().ok();
        let mut attempts = 0;

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, username_from_url, allowed| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str(&format!(
                    "authentication failed for {}",
                    url
                )));
            }

            let user = username
                .as_deref()
                .or(username_from_url)
                .unwrap_or("git");

            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(ref token) = token {
                    return Cred::userpass_plaintext(user, token);
                }
            }
            if allowed.contains(CredentialType::SSH_KEY) {
                return Cred::ssh_key_from_agent(user);
            }
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(ref cfg) = helper_config {
                    if let Ok(cred) = Cred::credential_helper(cfg, url, username_from_url) {
                        return Ok(cred);
                    }
                }
            }
            if allowed.contains(CredentialType::USERNAME) {
                return Cred::username(user);
            }
            Cred::default()
        });
        callbacks.transfer_progress(|progress| {
            trace!(
                received = progress.received_objects(),
                total = progress.total_objects(),
                "transfer progress"
            );
            true
        });

        callbacks
    }

    /// Build fetch options for clone or fetch
    pub fn fetch_options(&self) -> FetchOptions<'static> {
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(self.remote_callbacks());
        fetch_options
    }
}
