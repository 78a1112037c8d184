//! A store whose every operation fails.

use async_trait::async_trait;
use uuid::Uuid;
use verdant_certificates::domain::certificate::Certificate;
use verdant_certificates::domain::repository::{CertifiableEnrollment, CertificateRepository};
use verdant_community::domain::model::{Community, CommunityMember};
use verdant_community::domain::repository::CommunityRepository;
use verdant_core::core_value::CoreValue;
use verdant_core::error::DomainError;
use verdant_core::profile::{CorporateAccount, Profile, ProfileRepository};
use verdant_learning::domain::activity::ActivityResponse;
use verdant_learning::domain::enrollment::{Enrollment, LessonCompletion};
use verdant_learning::domain::gamification::{UserAchievement, UserStats};
use verdant_learning::domain::lesson::LessonDefinition;
use verdant_learning::domain::repository::{GamificationRepository, LearningRepository};
use verdant_marketplace::domain::cart::CartItem;
use verdant_marketplace::domain::module::{Lesson, MarketplaceModule, ModuleStatus};
use verdant_marketplace::domain::promo::PromoCode;
use verdant_marketplace::domain::purchase::{ItemFulfillment, PromoCodeUse};
use verdant_marketplace::domain::repository::{
    CartRepository, ModuleRepository, PromoCodeRepository, PurchaseRepository,
};
use verdant_reporting::domain::report::{EnrollmentRow, ModuleRow, ToolResultRow};
use verdant_reporting::domain::repository::ReportRepository;

/// A store that always returns an infrastructure error. Useful for testing
/// error-handling paths.
#[derive(Debug, Default)]
pub struct FailingStore;

fn down<T>() -> Result<T, DomainError> {
    Err(DomainError::Infrastructure("connection refused".into()))
}

#[async_trait]
impl ProfileRepository for FailingStore {
    async fn find_profile(&self, _id: Uuid) -> Result<Option<Profile>, DomainError> {
        down()
    }

    async fn list_account_members(&self, _account_id: Uuid) -> Result<Vec<Profile>, DomainError> {
        down()
    }

    async fn find_corporate_account(
        &self,
        _account_id: Uuid,
    ) -> Result<Option<CorporateAccount>, DomainError> {
        down()
    }
}

#[async_trait]
impl CommunityRepository for FailingStore {
    async fn find_community(&self, _id: Uuid) -> Result<Option<Community>, DomainError> {
        down()
    }

    async fn find_community_by_slug(&self, _slug: &str) -> Result<Option<Community>, DomainError> {
        down()
    }

    async fn list_communities(
        &self,
        _core_value: Option<CoreValue>,
    ) -> Result<Vec<Community>, DomainError> {
        down()
    }

    async fn create_community(
        &self,
        _community: &Community,
        _founder: &CommunityMember,
    ) -> Result<(), DomainError> {
        down()
    }

    async fn find_member(
        &self,
        _community_id: Uuid,
        _user_id: Uuid,
    ) -> Result<Option<CommunityMember>, DomainError> {
        down()
    }

    async fn list_members(&self, _community_id: Uuid) -> Result<Vec<CommunityMember>, DomainError> {
        down()
    }

    async fn add_member(&self, _member: &CommunityMember) -> Result<(), DomainError> {
        down()
    }

    async fn remove_member(&self, _community_id: Uuid, _user_id: Uuid) -> Result<(), DomainError> {
        down()
    }
}

#[async_trait]
impl ModuleRepository for FailingStore {
    async fn find_module(&self, _id: Uuid) -> Result<Option<MarketplaceModule>, DomainError> {
        down()
    }

    async fn list_modules(
        &self,
        _status: ModuleStatus,
        _core_value: Option<CoreValue>,
    ) -> Result<Vec<MarketplaceModule>, DomainError> {
        down()
    }

    async fn insert_module(&self, _module: &MarketplaceModule) -> Result<(), DomainError> {
        down()
    }

    async fn update_module(&self, _module: &MarketplaceModule) -> Result<(), DomainError> {
        down()
    }

    async fn list_lessons(&self, _module_id: Uuid) -> Result<Vec<Lesson>, DomainError> {
        down()
    }

    async fn insert_lesson(&self, _lesson: &Lesson) -> Result<(), DomainError> {
        down()
    }
}

#[async_trait]
impl CartRepository for FailingStore {
    async fn list_cart(&self, _user_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        down()
    }

    async fn upsert_cart_item(&self, _item: &CartItem) -> Result<(), DomainError> {
        down()
    }

    async fn remove_cart_item(&self, _user_id: Uuid, _module_id: Uuid) -> Result<bool, DomainError> {
        down()
    }

    async fn clear_cart(&self, _user_id: Uuid) -> Result<(), DomainError> {
        down()
    }
}

#[async_trait]
impl PromoCodeRepository for FailingStore {
    async fn find_promo_code(&self, _code: &str) -> Result<Option<PromoCode>, DomainError> {
        down()
    }

    async fn record_promo_use(&self, _redemption: &PromoCodeUse) -> Result<(), DomainError> {
        down()
    }
}

#[async_trait]
impl PurchaseRepository for FailingStore {
    async fn existing_enrollees(
        &self,
        _module_id: Uuid,
        _user_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, DomainError> {
        down()
    }

    async fn fulfill_item(&self, _item: &ItemFulfillment) -> Result<u64, DomainError> {
        down()
    }
}

#[async_trait]
impl LearningRepository for FailingStore {
    async fn list_enrollments(&self, _user_id: Uuid) -> Result<Vec<Enrollment>, DomainError> {
        down()
    }

    async fn find_enrollment(&self, _id: Uuid) -> Result<Option<Enrollment>, DomainError> {
        down()
    }

    async fn update_enrollment(&self, _enrollment: &Enrollment) -> Result<(), DomainError> {
        down()
    }

    async fn find_lesson(&self, _lesson_id: Uuid) -> Result<Option<LessonDefinition>, DomainError> {
        down()
    }

    async fn count_lessons(&self, _module_id: Uuid) -> Result<i64, DomainError> {
        down()
    }

    async fn find_activity_response(
        &self,
        _enrollment_id: Uuid,
        _lesson_id: Uuid,
    ) -> Result<Option<ActivityResponse>, DomainError> {
        down()
    }

    async fn list_activity_responses(
        &self,
        _enrollment_id: Uuid,
        _lesson_id: Option<Uuid>,
    ) -> Result<Vec<ActivityResponse>, DomainError> {
        down()
    }

    async fn upsert_activity_response(
        &self,
        _response: &ActivityResponse,
    ) -> Result<(), DomainError> {
        down()
    }

    async fn write_legacy_response(&self, _response: &ActivityResponse) -> Result<(), DomainError> {
        down()
    }

    async fn find_lesson_completion(
        &self,
        _enrollment_id: Uuid,
        _lesson_id: Uuid,
    ) -> Result<Option<LessonCompletion>, DomainError> {
        down()
    }

    async fn record_lesson_completion(
        &self,
        _completion: &LessonCompletion,
        _enrollment: &Enrollment,
    ) -> Result<bool, DomainError> {
        down()
    }

    async fn count_lesson_completions(&self, _enrollment_id: Uuid) -> Result<i64, DomainError> {
        down()
    }
}

#[async_trait]
impl GamificationRepository for FailingStore {
    async fn find_user_stats(&self, _user_id: Uuid) -> Result<Option<UserStats>, DomainError> {
        down()
    }

    async fn save_user_stats(&self, _stats: &UserStats) -> Result<(), DomainError> {
        down()
    }

    async fn list_achievements(&self, _user_id: Uuid) -> Result<Vec<UserAchievement>, DomainError> {
        down()
    }

    async fn unlock_achievement(&self, _achievement: &UserAchievement) -> Result<(), DomainError> {
        down()
    }
}

#[async_trait]
impl CertificateRepository for FailingStore {
    async fn find_certifiable_enrollment(
        &self,
        _enrollment_id: Uuid,
    ) -> Result<Option<CertifiableEnrollment>, DomainError> {
        down()
    }

    async fn find_certificate_by_enrollment(
        &self,
        _enrollment_id: Uuid,
    ) -> Result<Option<Certificate>, DomainError> {
        down()
    }

    async fn find_certificate_by_code(
        &self,
        _code: &str,
    ) -> Result<Option<Certificate>, DomainError> {
        down()
    }

    async fn insert_certificate(&self, _certificate: &Certificate) -> Result<(), DomainError> {
        down()
    }
}

#[async_trait]
impl ReportRepository for FailingStore {
    async fn list_employee_enrollments(
        &self,
        _account_id: Uuid,
    ) -> Result<Vec<EnrollmentRow>, DomainError> {
        down()
    }

    async fn list_modules_by_ids(&self, _ids: &[Uuid]) -> Result<Vec<ModuleRow>, DomainError> {
        down()
    }

    async fn list_employee_tool_results(
        &self,
        _account_id: Uuid,
    ) -> Result<Vec<ToolResultRow>, DomainError> {
        down()
    }
}
