use time::OffsetDateTime;
use uuid::Uuid;

/// Metadata for one shared secret, keyed by its public access name.
///
/// The access name is the unguessable public handle; the access code is
/// the short secret required alongside it to unlock the record. Codes are
/// not unique across records since lookup is always by name first.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretRecord {
    pub access_name: String,
    pub created: OffsetDateTime,
    pub resource_id: Uuid,
    pub access_code: String,
    pub number_of_accesses: i64,
}

/// Generate a fresh access name: a random v4 UUID rendered as a string.
///
/// Collisions are statistically negligible, but callers still retry on a
/// store conflict rather than assuming uniqueness for free.
pub fn generate_access_name() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a random access code from the given alphabet using the
/// system CSPRNG.
pub fn generate_access_code(length: usize, alphabet: &[u8]) -> String {
    let mut buff = vec![0u8; length];
    getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
    buff.into_iter()
        .map(|b| alphabet[b as usize % alphabet.len()] as char)
        .collect()
}

/// Compare two short secrets without leaking the match position through
/// timing. Inputs of different lengths compare unequal.
pub fn constant_time_eq(stored: &str, submitted: &str) -> bool {
    subtle::ConstantTimeEq::ct_eq(stored.as_bytes(), submitted.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_code_length_and_alphabet() {
        let alphabet = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        for _ in 0..32 {
            let code = generate_access_code(6, alphabet);
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| alphabet.contains(&b)));
        }
    }

    #[test]
    fn test_access_code_respects_custom_shape() {
        let code = generate_access_code(10, b"XY");
        assert_eq!(code.len(), 10);
        assert!(code.bytes().all(|b| b == b'X' || b == b'Y'));
    }

    #[test]
    fn test_access_names_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(generate_access_name()));
        }
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("ABCDEF", "ABCDEF"));
        assert!(!constant_time_eq("ABCDEF", "ABCDEG"));
        assert!(!constant_time_eq("ABCDEF", "abcdef"));
        assert!(!constant_time_eq("ABCDEF", "ABCDE"));
        assert!(!constant_time_eq("ABCDEF", ""));
    }
}
