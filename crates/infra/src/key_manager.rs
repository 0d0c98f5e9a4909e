//! SQLCipher key storage backed by the platform keyring.
//!
//! The key unlocks the fax job database; losing it makes the database
//! unreadable. A fresh key is therefore minted only when the keyring
//! positively reports that no entry exists. Any other keyring failure is
//! surfaced instead of silently rotating the key. Environment overrides
//! (test and deployment keys) are resolved by the caller before this module
//! is consulted.

use faxgate_domain::{FaxError, Result};
use keyring::Entry;
use rand::RngCore;

const SERVICE_NAME: &str = "com.faxgate.app";
const KEY_NAME: &str = "database_encryption_key";

/// Manages the SQLCipher key using the system keyring.
pub struct KeyManager;

impl KeyManager {
    /// Fetch the stored database key, minting and persisting one on first use.
    pub fn get_or_create_key() -> Result<String> {
        let entry = keyring_entry()?;

        match entry.get_password() {
            Ok(key) => Ok(key),
            Err(keyring::Error::NoEntry) => {
                let key = Self::generate_key();
                entry
                    .set_password(&key)
                    .map_err(|e| FaxError::Config(format!("Failed to store key: {e}")))?;
                Ok(key)
            }
            // Do not mint a replacement key here: the database is already
            // encrypted under the stored one.
            Err(e) => Err(FaxError::Config(format!("Failed to read key: {e}"))),
        }
    }

    /// 256 bits of randomness, hex-encoded for the SQLCipher pragma.
    fn generate_key() -> String {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        hex::encode(key)
    }

    /// Delete the stored encryption key (use with caution!)
    pub fn delete_key() -> Result<()> {
        let entry = keyring_entry()?;
        entry
            .delete_credential()
            .map_err(|e| FaxError::Config(format!("Failed to delete key: {e}")))?;
        Ok(())
    }
}

fn keyring_entry() -> Result<Entry> {
    Entry::new(SERVICE_NAME, KEY_NAME)
        .map_err(|e| FaxError::Config(format!("Failed to access keyring: {e}")))
}
