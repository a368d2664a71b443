//! At-rest encryption for license material.
//!
//! Payloads are sealed with ChaCha20-Poly1305 under a key derived (Argon2id)
//! from a secret the host supplies. Consumers go through the
//! [`EncryptionCodec`] trait so storage code never handles key bytes.
//!
//! Decryption failures are always reported as [`CryptoError::Decryption`],
//! which lets callers tell "nothing stored" apart from "stored but unreadable".

mod cipher;
mod codec;
mod error;
mod key;

pub use cipher::{MIN_BLOB_SIZE, NONCE_SIZE, TAG_SIZE, open, seal};
pub use codec::{CodecConfig, EncryptionCodec, PassthroughCodec, SecretCodec};
pub use error::{CryptoError, CryptoResult};
pub use key::{KEY_SIZE, KdfParams, MIN_SALT_SIZE, StorageKey};
