//! Marketplace modules, their lessons, and the review state machine.
//!
//! Status transitions: `draft → review` (creator submits), `review →
//! published` (admin approves), `review → draft` (admin rejects). Anything
//! else is rejected.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use verdant_core::core_value::CoreValue;
use verdant_core::error::DomainError;

const TITLE_MIN_CHARS: usize = 5;
const TITLE_MAX_CHARS: usize = 200;
const MAX_LESSON_XP: i32 = 1_000;

/// Publication status of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    /// Being authored; editable.
    Draft,
    /// Submitted and waiting for an admin.
    Review,
    /// Visible and purchasable.
    Published,
}

impl ModuleStatus {
    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "review" => Ok(Self::Review),
            "published" => Ok(Self::Published),
            other => Err(DomainError::infrastructure(format!(
                "unknown module status: {other}"
            ))),
        }
    }
}

/// Admin decision on a module under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    /// Publish the module.
    Approve,
    /// Send the module back to draft.
    Reject,
}

/// A purchasable training unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceModule {
    /// Module identifier.
    pub id: Uuid,
    /// Title shown in the catalog.
    pub title: String,
    /// Catalog description.
    pub description: String,
    /// Thematic tag.
    pub core_value: CoreValue,
    /// Community that authored the module; `None` for platform modules.
    pub creator_community_id: Option<Uuid>,
    /// Profile that authored the module.
    pub creator_user_id: Uuid,
    /// Price in minor units, per individual seat or per pack of employees.
    pub price_cents: i64,
    /// Publication status.
    pub status: ModuleStatus,
    /// Reviewer notes from the last rejection.
    pub review_notes: Option<String>,
    /// When the module was first published.
    pub published_at: Option<DateTime<Utc>>,
    /// Number of completed sales.
    pub purchase_count: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl MarketplaceModule {
    /// Creates a draft module.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a title outside 5..=200
    /// characters, an unknown core value, or a negative price.
    #[allow(clippy::too_many_arguments)]
    pub fn new_draft(
        id: Uuid,
        creator_community_id: Option<Uuid>,
        creator_user_id: Uuid,
        title: &str,
        description: &str,
        core_value: &str,
        price_cents: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let title = validate_title(title)?;
        let core_value: CoreValue = core_value.parse()?;
        if price_cents < 0 {
            return Err(DomainError::validation("El precio no puede ser negativo"));
        }

        Ok(Self {
            id,
            title,
            description: description.trim().to_owned(),
            core_value,
            creator_community_id,
            creator_user_id,
            price_cents,
            status: ModuleStatus::Draft,
            review_notes: None,
            published_at: None,
            purchase_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Ensures the module can still be edited by its creator.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless the module is a draft.
    pub fn ensure_editable(&self) -> Result<(), DomainError> {
        if self.status == ModuleStatus::Draft {
            Ok(())
        } else {
            Err(DomainError::validation(
                "Solo se pueden editar módulos en borrador",
            ))
        }
    }

    /// Moves a draft into review.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the module is not a draft, has no
    /// lessons, or has no price.
    pub fn submit_for_review(
        &mut self,
        lesson_count: usize,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_editable()?;
        if lesson_count == 0 {
            return Err(DomainError::validation(
                "El módulo necesita al menos una lección",
            ));
        }
        if self.price_cents <= 0 {
            return Err(DomainError::validation(
                "El módulo necesita un precio mayor a cero",
            ));
        }
        self.status = ModuleStatus::Review;
        self.updated_at = now;
        Ok(())
    }

    /// Applies an admin review decision.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the module is not under review or
    /// a rejection comes without notes.
    pub fn apply_review(
        &mut self,
        action: ReviewAction,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.status != ModuleStatus::Review {
            return Err(DomainError::validation(
                "El módulo no está pendiente de revisión",
            ));
        }
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());

        match action {
            ReviewAction::Approve => {
                self.status = ModuleStatus::Published;
                self.published_at.get_or_insert(now);
                self.review_notes = notes.map(str::to_owned);
            }
            ReviewAction::Reject => {
                let Some(notes) = notes else {
                    return Err(DomainError::validation(
                        "Indica el motivo del rechazo",
                    ));
                };
                self.status = ModuleStatus::Draft;
                self.review_notes = Some(notes.to_owned());
            }
        }
        self.updated_at = now;
        Ok(())
    }

    /// Whether the module was authored by a community (affects revenue split).
    #[must_use]
    pub fn is_community_module(&self) -> bool {
        self.creator_community_id.is_some()
    }
}

/// One lesson of a module.
///
/// `activity_config` is opaque to the marketplace; the learning context
/// interprets it when validating submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson identifier.
    pub id: Uuid,
    /// Owning module.
    pub module_id: Uuid,
    /// 1-based position inside the module.
    pub lesson_order: i32,
    /// Lesson title.
    pub title: String,
    /// Markdown body.
    pub content: String,
    /// XP granted on completion.
    pub xp_reward: i32,
    /// Activity kind (e.g. `reflection`, `waste_audit`).
    pub activity_type: String,
    /// Validation configuration for the activity.
    pub activity_config: serde_json::Value,
}

impl Lesson {
    /// Creates a lesson at the given position.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an invalid title, an empty
    /// activity type, or an XP reward outside 0..=1000.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        module_id: Uuid,
        lesson_order: i32,
        title: &str,
        content: &str,
        xp_reward: i32,
        activity_type: &str,
        activity_config: serde_json::Value,
    ) -> Result<Self, DomainError> {
        let title = validate_title(title)?;
        if !(0..=MAX_LESSON_XP).contains(&xp_reward) {
            return Err(DomainError::validation(format!(
                "La recompensa de XP debe estar entre 0 y {MAX_LESSON_XP}"
            )));
        }
        let activity_type = activity_type.trim();
        if activity_type.is_empty() {
            return Err(DomainError::validation(
                "El tipo de actividad es obligatorio",
            ));
        }

        Ok(Self {
            id,
            module_id,
            lesson_order,
            title,
            content: content.to_owned(),
            xp_reward,
            activity_type: activity_type.to_owned(),
            activity_config,
        })
    }
}

fn validate_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    let chars = title.chars().count();
    if (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&chars) {
        Ok(title.to_owned())
    } else {
        Err(DomainError::validation(format!(
            "El título debe tener entre {TITLE_MIN_CHARS} y {TITLE_MAX_CHARS} caracteres"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn draft(price_cents: i64) -> MarketplaceModule {
        MarketplaceModule::new_draft(
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            Uuid::new_v4(),
            "Calidad del aire en casa",
            "Mide y mejora",
            "clean_air",
            price_cents,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn test_submit_requires_lessons_and_price() {
        let mut module = draft(0);
        assert!(module.submit_for_review(0, fixed_now()).is_err());
        assert!(module.submit_for_review(3, fixed_now()).is_err());

        let mut module = draft(36_000);
        module.submit_for_review(3, fixed_now()).unwrap();
        assert_eq!(module.status, ModuleStatus::Review);
    }

    #[test]
    fn test_approve_publishes_and_stamps_published_at() {
        // Arrange
        let mut module = draft(36_000);
        module.submit_for_review(1, fixed_now()).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 1, 16, 9, 0, 0).unwrap();

        // Act
        module
            .apply_review(ReviewAction::Approve, None, later)
            .unwrap();

        // Assert
        assert_eq!(module.status, ModuleStatus::Published);
        assert_eq!(module.published_at, Some(later));
        assert_eq!(module.updated_at, later);
    }

    #[test]
    fn test_reject_returns_to_draft_with_notes() {
        let mut module = draft(36_000);
        module.submit_for_review(1, fixed_now()).unwrap();

        module
            .apply_review(ReviewAction::Reject, Some("  Falta bibliografía "), fixed_now())
            .unwrap();

        assert_eq!(module.status, ModuleStatus::Draft);
        assert_eq!(module.review_notes.as_deref(), Some("Falta bibliografía"));
    }

    #[test]
    fn test_reject_without_notes_is_invalid() {
        let mut module = draft(36_000);
        module.submit_for_review(1, fixed_now()).unwrap();

        let result = module.apply_review(ReviewAction::Reject, Some("   "), fixed_now());

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(module.status, ModuleStatus::Review);
    }

    #[test]
    fn test_review_of_draft_is_rejected() {
        let mut module = draft(36_000);
        let result = module.apply_review(ReviewAction::Approve, None, fixed_now());
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_published_module_is_not_editable() {
        let mut module = draft(36_000);
        module.submit_for_review(1, fixed_now()).unwrap();
        module
            .apply_review(ReviewAction::Approve, None, fixed_now())
            .unwrap();
        assert!(module.ensure_editable().is_err());
    }

    #[test]
    fn test_lesson_rejects_excessive_xp() {
        let result = Lesson::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            1,
            "Introducción",
            "",
            5_000,
            "reflection",
            serde_json::json!({}),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
