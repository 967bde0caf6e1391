use crc32fast::Hasher;
use rand::Rng;
use std::collections::HashSet;

use crate::attributes::KEY_PREFIX;

const OID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const OID_LENGTH: usize = 7;

/// Generate document ID from file path using CRC32
pub fn get_document_id(path: &str) -> String {
    let mut buff = String::from(path);
    if !path.starts_with("file://") {
        buff = format!("file://{}", buff);
    }

    let mut hasher = Hasher::new();
    hasher.update(buff.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// CRC32 of arbitrary content, used for cache validation
pub fn content_hash(content: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content.as_bytes());
    format!("{:08x}", hasher.finalize())
}

/// Source of fresh identifiers.
///
/// Production code uses [`RandomIds`]; tests and reproducible pipelines use
/// [`SequentialIds`].
pub trait IdSource {
    /// Fresh source identifier for the `data-oid` attribute
    fn next_oid(&mut self) -> String;

    /// Fresh reconciliation key for the `key` attribute
    fn next_key(&mut self) -> String {
        format!("{}{}", KEY_PREFIX, self.next_oid())
    }
}

/// Random short identifiers
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_oid(&mut self) -> String {
        generate_oid()
    }
}

/// Sequential ID generator seeded by a document ID
#[derive(Clone, Debug)]
pub struct SequentialIds {
    seed: String, // Document ID (CRC32)
    count: u32,   // Sequential counter
}

impl SequentialIds {
    pub fn new(path: &str) -> Self {
        Self {
            seed: get_document_id(path),
            count: 0,
        }
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Get document ID seed
    pub fn seed(&self) -> &str {
        &self.seed
    }
}

impl IdSource for SequentialIds {
    fn next_oid(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }
}

/// Wraps another source and skips identifiers that are already in use.
///
/// Every identifier handed out is added to the used set.
pub struct UnusedIds<'a> {
    inner: &'a mut dyn IdSource,
    used: HashSet<String>,
}

impl<'a> UnusedIds<'a> {
    pub fn new(inner: &'a mut dyn IdSource, used: impl IntoIterator<Item = String>) -> Self {
        Self {
            inner,
            used: used.into_iter().collect(),
        }
    }

    pub fn is_used(&self, id: &str) -> bool {
        self.used.contains(id)
    }
}

impl IdSource for UnusedIds<'_> {
    fn next_oid(&mut self) -> String {
        loop {
            let candidate = self.inner.next_oid();
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Random 7 character identifier drawn from `[a-z0-9]`
pub fn generate_oid() -> String {
    let mut rng = rand::thread_rng();
    (0..OID_LENGTH)
        .map(|_| OID_ALPHABET[rng.gen_range(0..OID_ALPHABET.len())] as char)
        .collect()
}

/// Runtime identifier for live elements
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}
