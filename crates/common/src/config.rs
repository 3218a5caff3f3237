use time::Duration;

/// Lifecycle rules for the secret engine, passed in at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// how long a secret stays accessible after creation
    pub ttl: Duration,
    /// length of generated access codes
    pub access_code_length: usize,
    /// alphabet access codes are drawn from
    pub access_code_alphabet: &'static [u8],
    /// file extensions accepted for file resources,
    ///  matched against the content type sniffed from the bytes
    pub allowed_file_types: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
            access_code_length: 6,
            access_code_alphabet: b"ABCDEFGHIJKLMNOPQRSTUVWXYZ",
            allowed_file_types: ["png", "jpg", "gif", "webp", "pdf", "zip"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}
