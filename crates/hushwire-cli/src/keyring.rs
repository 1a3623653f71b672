//! Contact keyring: correspondents' public keys by account name.

use anyhow::Context;
use hushwire_crypto::RsaPublicKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// File-backed map of account name to public key string (`"n,e"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Keyring {
    #[serde(default)]
    contacts: BTreeMap<String, String>,
}

impl Keyring {
    /// Load a keyring from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read keyring {}", path.display()))?;
        let keyring: Self = toml::from_str(&contents)?;
        Ok(keyring)
    }

    /// Load a keyring, or start an empty one if the file doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the keyring to file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Add a contact.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is already present or `key` does not parse
    /// as a public key.
    pub fn add(&mut self, name: &str, key: &str) -> anyhow::Result<()> {
        if self.contacts.contains_key(name) {
            anyhow::bail!("Contact already exists: {name}");
        }
        let key: RsaPublicKey = key
            .parse()
            .with_context(|| format!("Invalid public key for {name}"))?;

        tracing::debug!(contact = name, bits = key.bits(), "added contact");
        self.contacts.insert(name.to_string(), key.to_string());
        Ok(())
    }

    /// Remove a contact, returning whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.contacts.remove(name).is_some()
    }

    /// Public key for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the contact is unknown or its stored key is
    /// malformed.
    pub fn get(&self, name: &str) -> anyhow::Result<RsaPublicKey> {
        let key = self
            .contacts
            .get(name)
            .with_context(|| format!("Unknown contact: {name}"))?;
        key.parse()
            .with_context(|| format!("Stored key for {name} is malformed"))
    }

    /// Contact names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contacts.keys().map(String::as_str)
    }

    /// Number of contacts
    #[must_use]
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether the keyring has no contacts
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut keyring = Keyring::default();
        keyring.add("alice", "3233,17").unwrap();

        let key = keyring.get("alice").unwrap();
        assert_eq!(key.to_string(), "3233,17");
        assert_eq!(keyring.len(), 1);
    }

    #[test]
    fn test_add_duplicate_rejected() {
        let mut keyring = Keyring::default();
        keyring.add("alice", "3233,17").unwrap();
        assert!(keyring.add("alice", "3233,17").is_err());
    }

    #[test]
    fn test_add_invalid_key_rejected() {
        let mut keyring = Keyring::default();
        assert!(keyring.add("bob", "not a key").is_err());
        assert!(keyring.add("bob", "3233,17,2753").is_err());
        assert!(keyring.is_empty());
    }

    #[test]
    fn test_add_normalizes_whitespace() {
        let mut keyring = Keyring::default();
        keyring.add("carol", " 3233,17\n").unwrap();
        assert_eq!(keyring.get("carol").unwrap().to_string(), "3233,17");
    }

    #[test]
    fn test_remove() {
        let mut keyring = Keyring::default();
        keyring.add("alice", "3233,17").unwrap();

        assert!(keyring.remove("alice"));
        assert!(!keyring.remove("alice"));
        assert!(keyring.get("alice").is_err());
    }

    #[test]
    fn test_names_sorted() {
        let mut keyring = Keyring::default();
        keyring.add("zed", "3233,17").unwrap();
        keyring.add("amy", "3233,17").unwrap();

        let names: Vec<_> = keyring.names().collect();
        assert_eq!(names, ["amy", "zed"]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyring.toml");

        let mut keyring = Keyring::default();
        keyring.add("alice", "3233,17").unwrap();
        keyring.save(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[contacts]"));
        assert!(contents.contains("alice = \"3233,17\""));

        let loaded = Keyring::load(&path).unwrap();
        assert_eq!(loaded.get("alice").unwrap(), keyring.get("alice").unwrap());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let keyring = Keyring::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert!(keyring.is_empty());
    }

    #[test]
    fn test_get_malformed_stored_key() {
        let keyring: Keyring = toml::from_str("[contacts]\nmallory = \"zz\"\n").unwrap();
        assert!(keyring.get("mallory").is_err());
    }
}
