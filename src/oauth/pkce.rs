use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

/// A URL-safe random token carrying `bytes` bytes of entropy.
pub fn random_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// PKCE verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct PkceParams {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkceParams {
    pub fn generate() -> Self {
        // 32 bytes encode to a 43 character verifier, the minimum length allowed
        Self::from_verifier(random_token(32))
    }

    pub fn from_verifier(code_verifier: String) -> Self {
        let hash = Sha256::digest(code_verifier.as_bytes());
        Self {
            code_challenge: URL_SAFE_NO_PAD.encode(hash),
            code_verifier,
        }
    }
}
