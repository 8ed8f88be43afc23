use crc32fast::Hasher;

/// Derive a short, stable seed from a session id using CRC32
pub fn get_session_seed(session_id: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(session_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ID generator for revision entries within a session
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(session_id: &str) -> Self {
        Self::from_seed(get_session_seed(session_id))
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
