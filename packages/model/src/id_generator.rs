use crate::node::NodeId;
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// Hash a document identity (usually its project path) using CRC32
pub fn get_document_hash(identity: &str) -> u32 {
    let mut buff = String::from(identity);
    if !identity.starts_with("file://") {
        buff = format!("file://{}", buff);
    }

    let mut hasher = Hasher::new();
    hasher.update(buff.as_bytes());
    hasher.finalize()
}

/// Node id generator for one document.
///
/// Ids mix the document hash, the parent id, a per-document counter and a
/// random salt. They are practically unique within the document's lifetime,
/// not globally unique and not reproducible across runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdGenerator {
    seed: u32,
    count: u64,
}

impl IdGenerator {
    pub fn new(identity: &str) -> Self {
        Self::from_seed(get_document_hash(identity))
    }

    pub fn from_seed(seed: u32) -> Self {
        Self { seed, count: 0 }
    }

    /// Draw the next id. `parent` is `None` for top-level nodes.
    pub fn next_id(&mut self, parent: Option<NodeId>) -> NodeId {
        self.count += 1;
        let salt: u32 = rand::random();
        let parent = parent.unwrap_or(self.seed as u64);
        mix(self.seed, parent, self.count, salt)
    }

    /// Get document hash seed
    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

fn mix(seed: u32, parent: u64, count: u64, salt: u32) -> NodeId {
    let mut z = ((seed as u64) << 32) | salt as u64;
    z ^= parent.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = z.wrapping_add(count.rotate_left(29));

    // splitmix64 finalizer
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;

    // 0 is the root sentinel
    if z == 0 {
        1
    } else {
        z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_document_hash_generation() {
        let id1 = get_document_hash("/ui/main.uxml");
        let id2 = get_document_hash("/ui/main.uxml");

        // Same path always generates same hash
        assert_eq!(id1, id2);

        // Different paths generate different hashes
        let id3 = get_document_hash("/ui/card.uxml");
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_counter_is_monotonic() {
        let mut gen = IdGenerator::new("/ui/main.uxml");
        gen.next_id(None);
        gen.next_id(Some(42));
        assert_eq!(gen.count(), 2);
        assert_eq!(gen.seed(), get_document_hash("/ui/main.uxml"));
    }

    #[test]
    fn test_ids_are_practically_unique() {
        let mut gen = IdGenerator::new("/ui/main.uxml");
        let mut seen = HashSet::new();
        for i in 0..10_000u64 {
            let parent = if i % 3 == 0 { None } else { Some(i / 3 + 1) };
            let id = gen.next_id(parent);
            assert_ne!(id, 0);
            assert!(seen.insert(id), "duplicate id after {} draws", i);
        }
    }
}
