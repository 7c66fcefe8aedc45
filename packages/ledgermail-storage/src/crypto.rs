use base64::{Engine as _, engine::general_purpose::STANDARD};
use chacha20poly1305::{
	Key, XChaCha20Poly1305, XNonce,
	aead::{Aead, AeadCore, KeyInit, OsRng},
};

use crate::{Error, Result};

pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;

/// Encrypts mailbox passwords at rest. Payload layout is
/// `base64(nonce || ciphertext)` with a fresh random nonce per encryption.
pub struct CredentialCipher {
	cipher: XChaCha20Poly1305,
}
impl CredentialCipher {
	pub fn from_hex_key(hex_key: &str) -> Result<Self> {
		let bytes = hex::decode(hex_key.trim())
			.map_err(|_| Error::InvalidArgument("Credential key must be valid hex.".to_string()))?;

		if bytes.len() != KEY_LEN {
			return Err(Error::InvalidArgument(format!(
				"Credential key must be {KEY_LEN} bytes, got {}.",
				bytes.len()
			)));
		}

		Ok(Self { cipher: XChaCha20Poly1305::new(Key::from_slice(&bytes)) })
	}

	pub fn encrypt(&self, plaintext: &str) -> Result<String> {
		let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
		let ciphertext = self
			.cipher
			.encrypt(&nonce, plaintext.as_bytes())
			.map_err(|_| Error::Crypto("Failed to encrypt credential.".to_string()))?;
		let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());

		payload.extend_from_slice(&nonce);
		payload.extend_from_slice(&ciphertext);

		Ok(STANDARD.encode(payload))
	}

	pub fn decrypt(&self, encoded: &str) -> Result<String> {
		let payload = STANDARD
			.decode(encoded.trim())
			.map_err(|_| Error::Crypto("Credential is not valid base64.".to_string()))?;

		if payload.len() <= NONCE_LEN {
			return Err(Error::Crypto("Credential ciphertext is too short.".to_string()));
		}

		let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
		let plaintext = self
			.cipher
			.decrypt(XNonce::from_slice(nonce), ciphertext)
			.map_err(|_| Error::Crypto("Failed to decrypt credential.".to_string()))?;

		String::from_utf8(plaintext)
			.map_err(|_| Error::Crypto("Decrypted credential is not UTF-8.".to_string()))
	}
}
