use sha2::{Digest, Sha256};

pub fn fingerprint_bytes(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}
