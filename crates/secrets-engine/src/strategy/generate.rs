//! Username and password generation for database users

use chrono::Utc;
use rand::Rng;

use crate::core::SecretString;

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const LOWER_AND_DIGITS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Provider limit on database usernames
pub(crate) const MAX_USERNAME_LENGTH: usize = 64;

const SUFFIX_LENGTH: usize = 8;

/// Unique username: `{prefix}-{role}-{unix seconds}-{random}`
///
/// The role segment is shortened so the result fits the provider limit; the
/// timestamp and random suffix are always kept whole.
pub(crate) fn username(prefix: &str, role_name: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LENGTH)
        .map(|_| pick(&mut rng, LOWER_AND_DIGITS))
        .collect();
    let timestamp = Utc::now().timestamp();

    let fixed = format!("{timestamp}-{suffix}");
    let budget = MAX_USERNAME_LENGTH.saturating_sub(prefix.len() + fixed.len() + 2);
    let role: String = role_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .take(budget)
        .collect();

    format!("{prefix}-{role}-{fixed}")
}

/// Random alphanumeric password with at least one upper, lower and digit
pub(crate) fn password(length: usize) -> SecretString {
    let mut rng = rand::rng();
    let mut chars: Vec<char> = Vec::with_capacity(length);
    chars.push(pick(&mut rng, UPPER));
    chars.push(pick(&mut rng, LOWER));
    chars.push(pick(&mut rng, DIGITS));
    while chars.len() < length {
        chars.push(pick(&mut rng, ALPHANUMERIC));
    }

    // Fisher-Yates so the guaranteed classes are not always leading
    for i in (1..chars.len()).rev() {
        let j = rng.random_range(0..=i);
        chars.swap(i, j);
    }

    SecretString::new(chars.into_iter().collect::<String>())
}

fn pick(rng: &mut impl Rng, charset: &[u8]) -> char {
    char::from(charset[rng.random_range(0..charset.len())])
}
