//! Encrypted token file
//!
//! The token's JSON form is sealed with AES-256-GCM under a key derived (Argon2,
//! random salt) from the OAuth client credentials the process already holds.
//! Rotating the client secret therefore makes the old file unreadable, which
//! callers treat as "authorization required".

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uplinkbridge_domain::constants::TOKEN_FILE_PREFIX;
use uplinkbridge_domain::{Token, TokenError, TokenResult};

use super::traits::TokenStore;
use crate::crypto::{CryptoError, EncryptedData, EncryptionService};

/// Token file at `<dir>/.oauth_token_<hash of API base URL>`
pub struct FileTokenStore {
    path: PathBuf,
    passphrase: String,
}

impl fmt::Debug for FileTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTokenStore")
            .field("path", &self.path)
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

impl FileTokenStore {
    #[must_use]
    pub fn new(
        token_dir: impl AsRef<Path>,
        base_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Self {
        Self {
            path: token_dir.as_ref().join(Self::file_name(base_url)),
            passphrase: format!("{client_id}:{client_secret}"),
        }
    }

    /// Deterministic per-endpoint file name, so bridges for different API
    /// hosts can share a directory
    #[must_use]
    pub fn file_name(base_url: &str) -> String {
        let digest = hex::encode(Sha256::digest(base_url.as_bytes()));
        format!("{TOKEN_FILE_PREFIX}{}", &digest[..32])
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn seal(&self, token: &Token) -> TokenResult<String> {
        let plaintext =
            serde_json::to_vec(token).map_err(|e| TokenError::Serialization(e.to_string()))?;
        EncryptionService::from_password_with_salt(&self.passphrase, None)
            .and_then(|service| service.encrypt_to_string(&plaintext))
            .map_err(|e| TokenError::Serialization(e.to_string()))
    }

    fn open(&self, encoded: &str) -> TokenResult<Token> {
        let envelope = EncryptedData::decode(encoded).map_err(decryption)?;
        let salt = envelope
            .salt
            .as_deref()
            .ok_or_else(|| TokenError::Decryption("token file carries no key salt".into()))?;
        let service = EncryptionService::from_password_with_salt(&self.passphrase, Some(salt))
            .map_err(decryption)?;
        let plaintext = service.decrypt(&envelope).map_err(decryption)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| TokenError::Decryption(format!("invalid token record: {e}")))
    }
}

fn decryption(err: CryptoError) -> TokenError {
    TokenError::Decryption(err.to_string())
}

/// Write `contents` to a file only the owner can read
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;

    // The mode above only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    Ok(())
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn save(&self, token: &Token) -> TokenResult<()> {
        let sealed = self.seal(token)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Replace atomically so a crash never leaves a truncated token file
        let staging = self.path.with_extension("tmp");
        write_private(&staging, sealed.as_bytes()).await?;
        fs::rename(&staging, &self.path).await?;

        debug!(path = %self.path.display(), "Token persisted");
        Ok(())
    }

    async fn load(&self) -> TokenResult<Token> {
        let encoded = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TokenError::NotFound)
            }
            Err(e) => return Err(e.into()),
        };
        self.open(&encoded)
    }

    async fn delete(&self) -> TokenResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
