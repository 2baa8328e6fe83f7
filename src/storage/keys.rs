/// Supplies the key the store file is encrypted with
pub trait KeyProvider: Send + Sync {
    fn database_key(&self) -> String;
}

/// Returns a fixed key
///
/// Stands in until keys come from the platform keychain.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    key: String,
}

impl StaticKeyProvider {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for StaticKeyProvider {
    fn default() -> Self {
        Self::new("testkey")
    }
}

impl KeyProvider for StaticKeyProvider {
    fn database_key(&self) -> String {
        self.key.clone()
    }
}
