mod fingerprint;
mod probe;

pub use fingerprint::fingerprint_bytes;
pub use probe::{package_index_url, HttpIndexProbe, IndexProbe, ProbeError, DEFAULT_PROBE_TIMEOUT};

#[cfg(test)]
mod tests;
