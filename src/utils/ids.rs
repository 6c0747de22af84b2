use chrono::Utc;
use rand::Rng;

/// Candidate identifier generators for new accounts. Each returns a
/// candidate only — uniqueness is enforced by the registration
/// transaction's storage check, backed by the unique constraints on
/// `users`. Collisions are expected to be vanishingly rare (the keyspace
/// is large relative to load), but never impossible.
const IDENTIFIER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const PREFIX: &str = "BP";

/// Public user id: prefix + last 8 digits of unix-millis + 4 random
/// digits, 14 characters total.
pub fn generate_user_id() -> String {
    let millis = Utc::now().timestamp_millis().to_string();
    let timestamp = &millis[millis.len().saturating_sub(8)..];
    let random = rand::thread_rng().gen_range(1000..=9999);
    format!("{PREFIX}{timestamp}{random}")
}

/// 7-character username: prefix + 5 uniform draws from A-Z0-9.
pub fn generate_username() -> String {
    let mut username = String::from(PREFIX);
    username.extend(random_chars(5));
    username
}

/// 8-character referral code, uniform over A-Z0-9.
pub fn generate_referral_code() -> String {
    random_chars(8).collect()
}

fn random_chars(count: usize) -> impl Iterator<Item = char> {
    let mut rng = rand::thread_rng();
    (0..count).map(move |_| IDENTIFIER_ALPHABET[rng.gen_range(0..IDENTIFIER_ALPHABET.len())] as char)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_alphabet(s: &str) -> bool {
        s.bytes().all(|b| IDENTIFIER_ALPHABET.contains(&b))
    }

    #[test]
    fn user_id_is_prefix_plus_twelve_digits() {
        for _ in 0..50 {
            let id = generate_user_id();
            assert_eq!(id.len(), 14);
            assert!(id.starts_with(PREFIX));
            assert!(id[2..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn username_is_seven_chars_from_alphabet() {
        for _ in 0..50 {
            let username = generate_username();
            assert_eq!(username.len(), 7);
            assert!(username.starts_with(PREFIX));
            assert!(in_alphabet(&username[2..]));
        }
    }

    #[test]
    fn referral_code_is_eight_chars_from_alphabet() {
        for _ in 0..50 {
            let code = generate_referral_code();
            assert_eq!(code.len(), 8);
            assert!(in_alphabet(&code));
        }
    }

    #[test]
    fn referral_codes_vary() {
        let first = generate_referral_code();
        // 36^8 keyspace; a duplicate across a handful of draws means the
        // generator is broken, not unlucky.
        assert!((0..10).any(|_| generate_referral_code() != first));
    }
}
