//! Sealing of remembered access tokens
//!
//! Tokens are sealed with AES-256-GCM and the owning user id goes in as
//! associated data: a blob moved onto another user's session row no longer
//! opens. The key comes from Argon2id, normally over the machine identity.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use aimi_core::{Error, Result};
use argon2::Argon2;
use rand::RngCore;

pub const NONCE_LEN: usize = 12;

const PASSPHRASE_SALT: &[u8] = b"aimi-point/session-passphrase";
const MACHINE_SALT: &[u8] = b"aimi-point/machine-identity";

/// Access token as it sits in the `sessions` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedToken {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_LEN],
}

impl SealedToken {
    /// Rebuild from the stored `token_encrypted` and `iv` columns
    pub fn from_columns(ciphertext: Vec<u8>, nonce: &[u8]) -> Result<Self> {
        let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|_| {
            Error::EncryptionError(format!(
                "stored nonce is {} bytes, expected {}",
                nonce.len(),
                NONCE_LEN
            ))
        })?;
        Ok(Self { ciphertext, nonce })
    }
}

fn session_aad(user_id: &str) -> Vec<u8> {
    format!("aimi-session:{}", user_id).into_bytes()
}

/// Seals and opens access tokens for one local session store
pub struct SessionEncryptor {
    cipher: Aes256Gcm,
}

impl SessionEncryptor {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    /// Key stretched from a passphrase, used by tests and tooling
    pub fn from_password(passphrase: &str) -> Result<Self> {
        Ok(Self::new(&stretch(passphrase.as_bytes(), PASSPHRASE_SALT)?))
    }

    /// Seal `token` for `user_id` under a fresh nonce
    pub fn seal(&self, user_id: &str, token: &str) -> Result<SealedToken> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let aad = session_aad(user_id);
        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: token.as_bytes(),
                    aad: aad.as_slice(),
                },
            )
            .map_err(|_| Error::EncryptionError(format!("cannot seal token for {}", user_id)))?;

        Ok(SealedToken { ciphertext, nonce })
    }

    /// Open a token sealed for `user_id`. Fails for any other user id.
    pub fn open(&self, user_id: &str, sealed: &SealedToken) -> Result<String> {
        let aad = session_aad(user_id);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(&sealed.nonce),
                Payload {
                    msg: sealed.ciphertext.as_slice(),
                    aad: aad.as_slice(),
                },
            )
            .map_err(|_| {
                Error::EncryptionError(format!("stored token does not open for {}", user_id))
            })?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::EncryptionError("stored token is not UTF-8".into()))
    }
}

fn stretch(secret: &[u8], salt: &[u8]) -> Result<[u8; 32]> {
    let mut key = [0u8; 32];
    Argon2::default()
        .hash_password_into(secret, salt, &mut key)
        .map_err(|e| Error::EncryptionError(format!("Argon2 key derivation failed: {}", e)))?;
    Ok(key)
}

// ─── Machine identity ────────────────────────────────────────────────

/// What the session key is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineIdentity {
    pub machine_id: String,
    pub host: String,
}

impl MachineIdentity {
    /// Identity of the running machine; missing parts fall back to placeholders
    pub fn current() -> Self {
        let machine_id = machine_uid::get().unwrap_or_else(|_| "no-machine-id".to_string());
        let host = ["HOSTNAME", "COMPUTERNAME"]
            .iter()
            .find_map(|var| std::env::var(var).ok())
            .unwrap_or_else(|| "unknown-host".to_string());
        Self { machine_id, host }
    }

    pub fn derive_key(&self) -> Result<[u8; 32]> {
        let secret = format!("{}@{}", self.machine_id, self.host);
        stretch(secret.as_bytes(), MACHINE_SALT)
    }
}

/// Key for the local session store on this machine.
///
/// A copied database file does not open on another machine.
pub fn derive_machine_key() -> Result<[u8; 32]> {
    MachineIdentity::current().derive_key()
}
