//! # Claimer Key Material
//!
//! The claimer's master secret: generated from the OS CSPRNG, or derived
//! deterministically from a BIP39 mnemonic and password.
//!
//! ```text
//! mnemonic + password ──BIP39──▶ 64-byte seed ──HKDF-SHA256──▶ master secret
//!                                                 info = "acred/claimer/master" [|| index]
//! ```
//!
//! ## Security Invariant
//!
//! - `KeyMaterial` has no `Serialize` impl. [`KeyMaterial::export()`] is the
//!   only way out, and callers must opt into it.
//! - `Debug` never prints secret bytes.
//! - Secrets are zeroized on drop.

use acred_core::{hex, ClaimerError, MessageKind};
use acred_engine::MasterSecret;
use bip39::Mnemonic;
use hkdf::Hkdf;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

const HKDF_SALT: &[u8] = b"acred/claimer/v1";
const HKDF_INFO: &[u8] = b"acred/claimer/master";

/// The claimer's private key material.
pub struct KeyMaterial {
    secret: MasterSecret,
    derivation_index: Option<u32>,
}

/// Wire shape of an exported key.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct ExportedKey {
    master_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    derivation_index: Option<u32>,
}

impl KeyMaterial {
    /// Fresh key material from the OS random source.
    pub fn generate() -> Result<Self, ClaimerError> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        OsRng
            .try_fill_bytes(&mut bytes[..])
            .map_err(|e| ClaimerError::Entropy(e.to_string()))?;
        tracing::debug!("generated claimer key material");
        Ok(Self {
            secret: MasterSecret::from_bytes(*bytes),
            derivation_index: None,
        })
    }

    /// Derive key material from a mnemonic and password.
    ///
    /// The password may be empty. The mnemonic may not.
    pub fn from_mnemonic(mnemonic: &str, password: &str) -> Result<Self, ClaimerError> {
        Self::derive(mnemonic, password, None)
    }

    /// Derive the key at `index` from a mnemonic and password. Each index
    /// yields an independent key; index-less derivation is distinct from all
    /// of them.
    pub fn from_mnemonic_at(
        mnemonic: &str,
        password: &str,
        index: u32,
    ) -> Result<Self, ClaimerError> {
        Self::derive(mnemonic, password, Some(index))
    }

    fn derive(mnemonic: &str, password: &str, index: Option<u32>) -> Result<Self, ClaimerError> {
        if mnemonic.trim().is_empty() {
            return Err(ClaimerError::MissingInput {
                operation: "key_from_mnemonic",
                missing: "mnemonic",
            });
        }
        let parsed =
            Mnemonic::parse(mnemonic).map_err(|e| ClaimerError::InvalidMnemonic(e.to_string()))?;
        let seed = Zeroizing::new(parsed.to_seed(password));

        let mut info = HKDF_INFO.to_vec();
        if let Some(i) = index {
            info.extend_from_slice(&i.to_be_bytes());
        }
        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), &seed[..]);
        let mut okm = Zeroizing::new([0u8; 32]);
        hk.expand(&info, &mut okm[..])
            .map_err(|e| ClaimerError::InvalidMnemonic(format!("key expansion failed: {e}")))?;

        tracing::debug!(derivation_index = ?index, "derived claimer key material from mnemonic");
        Ok(Self {
            secret: MasterSecret::from_bytes(*okm),
            derivation_index: index,
        })
    }

    /// A fresh 24-word mnemonic.
    pub fn generate_mnemonic() -> Result<Zeroizing<String>, ClaimerError> {
        let mut entropy = Zeroizing::new([0u8; 32]);
        OsRng
            .try_fill_bytes(&mut entropy[..])
            .map_err(|e| ClaimerError::Entropy(e.to_string()))?;
        let mnemonic = Mnemonic::from_entropy(&entropy[..])
            .map_err(|e| ClaimerError::Entropy(format!("mnemonic generation failed: {e}")))?;
        Ok(Zeroizing::new(mnemonic.to_string()))
    }

    /// The master secret handed to the credential engine.
    pub fn secret(&self) -> &MasterSecret {
        &self.secret
    }

    /// Index used at derivation, if any.
    pub fn derivation_index(&self) -> Option<u32> {
        self.derivation_index
    }

    /// Export as JSON text. Treat the result as a secret.
    pub fn export(&self) -> Result<Zeroizing<String>, ClaimerError> {
        let exported = ExportedKey {
            master_secret: hex::encode(self.secret.expose()),
            derivation_index: self.derivation_index,
        };
        let text = serde_json::to_string(&exported)
            .map_err(|e| ClaimerError::malformed(MessageKind::ClaimerKey, e.to_string()))?;
        Ok(Zeroizing::new(text))
    }

    /// Import key material previously produced by [`export`](Self::export).
    pub fn import(text: &str) -> Result<Self, ClaimerError> {
        let exported: ExportedKey = serde_json::from_str(text)
            .map_err(|e| ClaimerError::malformed(MessageKind::ClaimerKey, e.to_string()))?;
        let raw = Zeroizing::new(
            hex::decode(&exported.master_secret)
                .map_err(|e| ClaimerError::malformed(MessageKind::ClaimerKey, e))?,
        );
        let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
            ClaimerError::malformed(
                MessageKind::ClaimerKey,
                format!("master secret must be 32 bytes, got {}", raw.len()),
            )
        })?;
        let secret = MasterSecret::from_bytes(bytes);
        Ok(Self {
            secret,
            derivation_index: exported.derivation_index,
        })
    }
}

impl PartialEq for KeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.secret == other.secret && self.derivation_index == other.derivation_index
    }
}

impl Eq for KeyMaterial {}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("secret", &"[REDACTED]")
            .field("derivation_index", &self.derivation_index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon \
                          abandon abandon abandon abandon abandon abandon abandon abandon \
                          abandon abandon abandon abandon abandon abandon abandon art";

    #[test]
    fn generated_keys_differ() {
        let a = KeyMaterial::generate().unwrap();
        let b = KeyMaterial::generate().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.derivation_index(), None);
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = KeyMaterial::from_mnemonic(PHRASE, "pw").unwrap();
        let b = KeyMaterial::from_mnemonic(PHRASE, "pw").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn password_changes_the_key() {
        let a = KeyMaterial::from_mnemonic(PHRASE, "pw").unwrap();
        let b = KeyMaterial::from_mnemonic(PHRASE, "other").unwrap();
        let empty = KeyMaterial::from_mnemonic(PHRASE, "").unwrap();
        assert_ne!(a.secret(), b.secret());
        assert_ne!(a.secret(), empty.secret());
    }

    #[test]
    fn indices_yield_distinct_keys() {
        let base = KeyMaterial::from_mnemonic(PHRASE, "pw").unwrap();
        let k0 = KeyMaterial::from_mnemonic_at(PHRASE, "pw", 0).unwrap();
        let k1 = KeyMaterial::from_mnemonic_at(PHRASE, "pw", 1).unwrap();
        assert_ne!(base.secret(), k0.secret());
        assert_ne!(k0.secret(), k1.secret());
        assert_eq!(k1.derivation_index(), Some(1));
        assert_eq!(k1, KeyMaterial::from_mnemonic_at(PHRASE, "pw", 1).unwrap());
    }

    #[test]
    fn empty_mnemonic_is_missing_input() {
        let err = KeyMaterial::from_mnemonic("  ", "pw").unwrap_err();
        assert!(matches!(
            err,
            ClaimerError::MissingInput {
                missing: "mnemonic",
                ..
            }
        ));
    }

    #[test]
    fn bad_checksum_is_invalid_mnemonic() {
        let bad = PHRASE.replace(" art", " abandon");
        assert!(matches!(
            KeyMaterial::from_mnemonic(&bad, "pw"),
            Err(ClaimerError::InvalidMnemonic(_))
        ));
        assert!(matches!(
            KeyMaterial::from_mnemonic("not a real mnemonic phrase", "pw"),
            Err(ClaimerError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn generated_mnemonic_has_24_words_and_derives() {
        let phrase = KeyMaterial::generate_mnemonic().unwrap();
        assert_eq!(phrase.split_whitespace().count(), 24);
        assert!(KeyMaterial::from_mnemonic(&phrase, "").is_ok());
    }

    #[test]
    fn export_import_roundtrip() {
        let key = KeyMaterial::from_mnemonic_at(PHRASE, "pw", 3).unwrap();
        let text = key.export().unwrap();
        let back = KeyMaterial::import(&text).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn import_rejects_short_secret() {
        let err = KeyMaterial::import(r#"{"master_secret":"abcd"}"#).unwrap_err();
        assert!(matches!(
            err,
            ClaimerError::MalformedMessage {
                kind: MessageKind::ClaimerKey,
                ..
            }
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let key = KeyMaterial::generate().unwrap();
        let dbg = format!("{key:?}");
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains(&hex::encode(key.secret().expose())));
    }
}
