use chrono::Utc;
use rand::Rng;

/// Generates human-readable codes for orders and employees.
///
/// Injected as a collaborator so code generation is swappable in tests and
/// not tied to wall-clock state hidden inside the services.
pub trait CodeGenerator: Send + Sync {
    /// Produce a code with the given prefix, e.g. "OID" or "EMP".
    fn generate(&self, prefix: &str) -> String;
}

/// Default generator: zero-padded month/day/hour/minute/second body with a
/// short random suffix. The suffix removes the collision risk two creations
/// within the same second would otherwise have.
#[derive(Debug, Default, Clone)]
pub struct TimestampCodeGenerator;

const SUFFIX_LEN: usize = 4;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

impl CodeGenerator for TimestampCodeGenerator {
    fn generate(&self, prefix: &str) -> String {
        let now = Utc::now();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..SUFFIX_ALPHABET.len());
                SUFFIX_ALPHABET[idx] as char
            })
            .collect();

        format!("{}-{}-{}", prefix, now.format("%m%d%H%M%S"), suffix)
    }
}
