//! Certificates and verification codes.
//!
//! Codes look like `VRD-7KQ2-M9XD`: a fixed prefix and two groups of four
//! characters drawn from an alphabet without look-alikes (no `0/O`, `1/I`).

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use verdant_core::core_value::CoreValue;
use verdant_core::rng::DeterministicRng;

/// Prefix of every verification code.
pub const CODE_PREFIX: &str = "VRD";

/// Characters used in verification codes.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const GROUP_LEN: usize = 4;
const GROUPS: usize = 2;

/// A certificate of completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    /// Certificate identifier.
    pub id: Uuid,
    /// Completed enrollment; one certificate each.
    pub enrollment_id: Uuid,
    /// Holder.
    pub user_id: Uuid,
    /// Module completed.
    pub module_id: Uuid,
    /// Holder's name at issue time.
    pub holder_name: String,
    /// Module title at issue time.
    pub module_title: String,
    /// Module core value.
    pub core_value: CoreValue,
    /// Public verification code.
    pub verification_code: String,
    /// XP earned in the module.
    pub xp_earned: i64,
    /// Issue time.
    pub issued_at: DateTime<Utc>,
}

/// Public view of a verified certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedCertificate {
    /// Holder's name.
    pub holder_name: String,
    /// Module title.
    pub module_title: String,
    /// Module core value.
    pub core_value: CoreValue,
    /// Issue time.
    pub issued_at: DateTime<Utc>,
    /// Verification code.
    pub verification_code: String,
    /// XP earned in the module.
    pub xp_earned: i64,
}

impl From<Certificate> for VerifiedCertificate {
    fn from(c: Certificate) -> Self {
        Self {
            holder_name: c.holder_name,
            module_title: c.module_title,
            core_value: c.core_value,
            issued_at: c.issued_at,
            verification_code: c.verification_code,
            xp_earned: c.xp_earned,
        }
    }
}

/// Draws a fresh verification code.
pub fn generate_verification_code(rng: &mut dyn DeterministicRng) -> String {
    let mut code = String::with_capacity(CODE_PREFIX.len() + GROUPS * (GROUP_LEN + 1));
    code.push_str(CODE_PREFIX);
    for _ in 0..GROUPS {
        code.push('-');
        for _ in 0..GROUP_LEN {
            let idx = rng.next_index(CODE_ALPHABET.len());
            code.push(char::from(CODE_ALPHABET[idx % CODE_ALPHABET.len()]));
        }
    }
    code
}

/// Normalizes user input for lookup: surrounding whitespace is ignored and
/// letters are upper-cased.
#[must_use]
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}
