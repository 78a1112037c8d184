//! Community model: the community itself and its member roster.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use verdant_core::core_value::CoreValue;
use verdant_core::error::DomainError;

const NAME_MIN_CHARS: usize = 3;
const NAME_MAX_CHARS: usize = 100;

/// A named group organized around one or more core values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    /// Community identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// URL-safe unique handle derived from the name.
    pub slug: String,
    /// Free-form description.
    pub description: String,
    /// Thematic tags; never empty.
    pub core_values: Vec<CoreValue>,
    /// Profile that created the community.
    pub founder_id: Uuid,
    /// Number of members, founder included.
    pub member_count: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Community {
    /// Builds a new community with its founder counted as the first member.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name length is outside
    /// 3..=100 characters, no core value is given, or a core value is unknown.
    pub fn new(
        id: Uuid,
        founder_id: Uuid,
        name: &str,
        description: &str,
        core_values: &[String],
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = name.trim();
        let chars = name.chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
            return Err(DomainError::validation(format!(
                "El nombre debe tener entre {NAME_MIN_CHARS} y {NAME_MAX_CHARS} caracteres"
            )));
        }

        let mut values = Vec::with_capacity(core_values.len());
        for raw in core_values {
            let value: CoreValue = raw.trim().parse()?;
            if !values.contains(&value) {
                values.push(value);
            }
        }
        if values.is_empty() {
            return Err(DomainError::validation(
                "Selecciona al menos un valor central",
            ));
        }

        let slug = slugify(name);
        if slug.is_empty() {
            return Err(DomainError::validation(
                "El nombre debe contener letras o números",
            ));
        }

        Ok(Self {
            id,
            name: name.to_owned(),
            slug,
            description: description.trim().to_owned(),
            core_values: values,
            founder_id,
            member_count: 1,
            created_at: now,
        })
    }
}

/// Role of a member inside a community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Created the community; cannot leave it.
    Founder,
    /// Manages the community and its modules.
    Admin,
    /// Regular member.
    Member,
}

impl MemberRole {
    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Founder => "founder",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    /// Whether the role may author modules on behalf of the community.
    #[must_use]
    pub const fn can_manage(self) -> bool {
        matches!(self, Self::Founder | Self::Admin)
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "founder" => Ok(Self::Founder),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(DomainError::infrastructure(format!(
                "unknown member role: {other}"
            ))),
        }
    }
}

/// A profile's membership in a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityMember {
    /// The community.
    pub community_id: Uuid,
    /// The member profile.
    pub user_id: Uuid,
    /// Role inside the community.
    pub role: MemberRole,
    /// When the membership started.
    pub joined_at: DateTime<Utc>,
}

/// Derives a URL-safe slug: lower-case ASCII alphanumerics separated by
/// single dashes. Accented Latin letters are folded to their base letter.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        let folded = fold_accent(ch);
        if folded.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(folded);
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_slugify_folds_accents_and_collapses_separators() {
        assert_eq!(slugify("  Aire Limpio — Monterrey "), "aire-limpio-monterrey");
        assert_eq!(slugify("Niños & Árboles"), "ninos-arboles");
    }

    #[test]
    fn test_new_community_counts_founder_and_dedupes_values() {
        // Arrange
        let founder = Uuid::new_v4();
        let values = vec![
            "clean_air".to_owned(),
            "zero_waste".to_owned(),
            "clean_air".to_owned(),
        ];

        // Act
        let community = Community::new(
            Uuid::new_v4(),
            founder,
            "Vecinos Verdes",
            "  Barrio sin basura ",
            &values,
            fixed_now(),
        )
        .unwrap();

        // Assert
        assert_eq!(community.slug, "vecinos-verdes");
        assert_eq!(community.member_count, 1);
        assert_eq!(community.description, "Barrio sin basura");
        assert_eq!(
            community.core_values,
            vec![CoreValue::CleanAir, CoreValue::ZeroWaste]
        );
    }

    #[test]
    fn test_new_community_requires_a_core_value() {
        let result = Community::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Vecinos Verdes",
            "",
            &[],
            fixed_now(),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_new_community_rejects_short_name() {
        let result = Community::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "ab",
            "",
            &["clean_air".to_owned()],
            fixed_now(),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_only_founder_and_admin_can_manage() {
        assert!(MemberRole::Founder.can_manage());
        assert!(MemberRole::Admin.can_manage());
        assert!(!MemberRole::Member.can_manage());
    }
}
