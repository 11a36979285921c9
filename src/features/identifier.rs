//! Request trace identifier capability.
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::{SystemTime, UNIX_EPOCH};

/// Per-request trace identifier, generated on first access when the
/// transport did not supply one.
#[derive(Debug, Default)]
pub struct RequestId {
    id: Option<String>,
}

impl RequestId {
    /// Create [`RequestId`] with no identifier assigned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create [`RequestId`] with a transport-supplied identifier.
    pub fn with(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
        }
    }

    /// Returns the identifier, generating one on first access.
    pub fn get_or_generate(&mut self) -> &str {
        self.id.get_or_insert_with(next_id)
    }

    /// Replace the identifier.
    pub fn set(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }
}

const CHARSET: &[u8; 32] = b"0123456789ABCDEFGHIJKLMNOPQRSTUV";

/// 13 characters of base32 over a process-wide counter seeded from the
/// clock, so identifiers stay unique across restarts.
fn next_id() -> String {
    static NEXT: std::sync::OnceLock<AtomicU64> = std::sync::OnceLock::new();

    let counter = NEXT.get_or_init(|| {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|dur| dur.as_nanos() as u64)
            .unwrap_or_default();
        AtomicU64::new(seed)
    });
    let mut value = counter.fetch_add(1, Relaxed);

    let mut buf = [0u8; 13];
    for slot in buf.iter_mut().rev() {
        *slot = CHARSET[(value & 31) as usize];
        value >>= 5;
    }
    // CHARSET is ASCII
    str::from_utf8(&buf).unwrap_or_default().to_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn generates_once() {
        let mut id = RequestId::new();
        let first = id.get_or_generate().to_owned();
        assert_eq!(first.len(), 13);
        assert_eq!(id.get_or_generate(), first);
    }

    #[test]
    fn distinct_across_instances() {
        let a = RequestId::new().get_or_generate().to_owned();
        let b = RequestId::new().get_or_generate().to_owned();
        assert_ne!(a, b);
    }

    #[test]
    fn supplied_identifier_wins() {
        let mut id = RequestId::with("trace-1");
        assert_eq!(id.get_or_generate(), "trace-1");
    }
}
