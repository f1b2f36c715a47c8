//! Small helpers for client setup.

use rand::Rng;

/// Generate a pseudo-IMEI for a new client identity.
///
/// The vendor only checks the `2b950000` prefix; the suffix is a random
/// eight-digit number. Generate one per installation, persist it alongside
/// the token, and reuse it for every session.
pub fn generate_imei() -> String {
    let suffix: u64 = rand::thread_rng().gen_range(10_000_000..100_000_000);
    format!("2b950000{suffix}")
}
