use sha2::{Digest, Sha256};

/// Anonymized `NNNNN-LLL` code derived from a seed.
///
/// The same seed always yields the same code, so a clinician can match
/// reports for one subject without seeing who the subject is.
pub fn subject_code(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let number = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) % 100_000;
    let letters: String = digest[4..7]
        .iter()
        .map(|byte| char::from(b'A' + byte % 26))
        .collect();
    format!("{number:05}-{letters}")
}
