//! Builders for commonly seeded records.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;
use verdant_core::core_value::CoreValue;
use verdant_core::profile::{CorporateRole, Profile, UserRole};
use verdant_core::purchase::PurchaseType;
use verdant_learning::domain::activity::ActivityResponse;
use verdant_learning::domain::enrollment::{Enrollment, EnrollmentStatus};
use verdant_marketplace::domain::module::{Lesson, MarketplaceModule, ModuleStatus};

/// A regular learner.
#[must_use]
pub fn learner(name: &str) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        email: format!("{}@verdant.test", name.to_lowercase().replace(' ', ".")),
        full_name: name.to_owned(),
        role: UserRole::User,
        corporate_account_id: None,
        corporate_role: None,
    }
}

/// A platform administrator.
#[must_use]
pub fn platform_admin(name: &str) -> Profile {
    Profile {
        role: UserRole::Admin,
        ..learner(name)
    }
}

/// An administrator of a corporate account.
#[must_use]
pub fn corporate_admin(name: &str, account_id: Uuid) -> Profile {
    Profile {
        corporate_account_id: Some(account_id),
        corporate_role: Some(CorporateRole::Admin),
        ..learner(name)
    }
}

/// An employee of a corporate account.
#[must_use]
pub fn employee(name: &str, account_id: Uuid) -> Profile {
    Profile {
        corporate_account_id: Some(account_id),
        corporate_role: Some(CorporateRole::Employee),
        ..learner(name)
    }
}

/// A published module with the given price.
#[must_use]
pub fn published_module(
    title: &str,
    price_cents: i64,
    creator_community_id: Option<Uuid>,
    creator_user_id: Uuid,
    now: DateTime<Utc>,
) -> MarketplaceModule {
    MarketplaceModule {
        id: Uuid::new_v4(),
        title: title.to_owned(),
        description: format!("Descripción de {title}"),
        core_value: CoreValue::ZeroWaste,
        creator_community_id,
        creator_user_id,
        price_cents,
        status: ModuleStatus::Published,
        review_notes: None,
        published_at: Some(now),
        purchase_count: 0,
        created_at: now,
        updated_at: now,
    }
}

/// A lesson of a module.
#[must_use]
pub fn lesson(
    module_id: Uuid,
    lesson_order: i32,
    activity_type: &str,
    xp_reward: i32,
    activity_config: Value,
) -> Lesson {
    Lesson {
        id: Uuid::new_v4(),
        module_id,
        lesson_order,
        title: format!("Lección {lesson_order}"),
        content: "## Contenido\n\nTexto de la lección.".to_owned(),
        xp_reward,
        activity_type: activity_type.to_owned(),
        activity_config,
    }
}

/// A fresh individual enrollment.
#[must_use]
pub fn enrollment(user_id: Uuid, module_id: Uuid, now: DateTime<Utc>) -> Enrollment {
    Enrollment {
        id: Uuid::new_v4(),
        user_id,
        module_id,
        corporate_account_id: None,
        purchase_type: PurchaseType::Individual,
        price_paid_cents: 0,
        status: EnrollmentStatus::NotStarted,
        progress_percentage: 0,
        completed: false,
        completed_at: None,
        xp_earned: 0,
        purchased_at: now,
        last_accessed_at: None,
    }
}

/// A saved response carrying one calculator result.
#[must_use]
pub fn tool_response(
    enrollment: &Enrollment,
    tool_name: &str,
    result: Value,
    now: DateTime<Utc>,
) -> ActivityResponse {
    let mut tool_results = Map::new();
    tool_results.insert(tool_name.to_owned(), result);
    ActivityResponse {
        enrollment_id: enrollment.id,
        lesson_id: Uuid::new_v4(),
        module_id: enrollment.module_id,
        user_id: enrollment.user_id,
        activity_type: "tool".to_owned(),
        responses: Map::new(),
        reflection: None,
        tool_results,
        evidence_urls: Vec::new(),
        questions_answered: None,
        total_questions: None,
        completion_percentage: 100,
        time_spent_minutes: 0,
        created_at: now,
        updated_at: now,
    }
}
