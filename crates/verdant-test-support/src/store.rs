//! In-memory implementation of every repository trait.
//!
//! One store backs all contexts so that cross-context flows (a purchase
//! creating enrollments that learners then complete and certify) can be
//! tested end to end.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

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
use verdant_learning::domain::enrollment::{Enrollment, EnrollmentStatus, LessonCompletion};
use verdant_learning::domain::gamification::{UserAchievement, UserStats};
use verdant_learning::domain::lesson::{ActivityConfig, LessonDefinition};
use verdant_learning::domain::repository::{GamificationRepository, LearningRepository};
use verdant_marketplace::domain::cart::CartItem;
use verdant_marketplace::domain::module::{Lesson, MarketplaceModule, ModuleStatus};
use verdant_marketplace::domain::pricing::RevenueSplit;
use verdant_marketplace::domain::promo::PromoCode;
use verdant_marketplace::domain::purchase::{ItemFulfillment, PromoCodeUse};
use verdant_marketplace::domain::repository::{
    CartRepository, ModuleRepository, PromoCodeRepository, PurchaseRepository,
};
use verdant_reporting::domain::report::{EnrollmentRow, ModuleRow, ToolResultRow};
use verdant_reporting::domain::repository::ReportRepository;

/// A revenue distribution performed during fulfillment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSale {
    /// Module sold.
    pub module_id: Uuid,
    /// Buyer credited.
    pub buyer_id: Uuid,
    /// Sale amount, in minor units.
    pub amount_cents: i64,
    /// How the amount was split.
    pub split: RevenueSplit,
}

#[derive(Debug, Default)]
struct State {
    profiles: Vec<Profile>,
    accounts: Vec<CorporateAccount>,
    communities: Vec<Community>,
    members: Vec<CommunityMember>,
    modules: Vec<MarketplaceModule>,
    lessons: Vec<Lesson>,
    cart: Vec<CartItem>,
    promo_codes: Vec<PromoCode>,
    promo_uses: Vec<PromoCodeUse>,
    sales: Vec<RecordedSale>,
    enrollments: Vec<Enrollment>,
    responses: Vec<ActivityResponse>,
    legacy_responses: Vec<ActivityResponse>,
    completions: Vec<LessonCompletion>,
    stats: HashMap<Uuid, UserStats>,
    achievements: Vec<UserAchievement>,
    certificates: Vec<Certificate>,
}

impl State {
    fn member_ids(&self, account_id: Uuid) -> HashSet<Uuid> {
        self.profiles
            .iter()
            .filter(|p| p.corporate_account_id == Some(account_id))
            .map(|p| p.id)
            .collect()
    }
}

/// Injected failures, keyed by trait method name.
#[derive(Debug, Default)]
struct Faults {
    always: HashSet<&'static str>,
    on_call: HashMap<&'static str, usize>,
    calls: HashMap<&'static str, usize>,
}

/// An in-memory store implementing every repository trait.
///
/// Individual operations can be made to fail with [`InMemoryStore::fail_on`]
/// or [`InMemoryStore::fail_on_call`], using the trait method name (e.g.
/// `"record_promo_use"`).
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    faults: Mutex<Faults>,
}

macro_rules! snapshot {
    ($(#[$doc:meta] $name:ident -> $ty:ty => $field:ident;)*) => {
        $(
            #[$doc]
            ///
            /// # Panics
            ///
            /// Panics if the internal mutex is poisoned.
            pub fn $name(&self) -> Vec<$ty> {
                self.state.lock().unwrap().$field.clone()
            }
        )*
    };
}

macro_rules! seed {
    ($(#[$doc:meta] $name:ident($ty:ty) => $field:ident;)*) => {
        $(
            #[$doc]
            ///
            /// # Panics
            ///
            /// Panics if the internal mutex is poisoned.
            pub fn $name(&self, value: $ty) {
                self.state.lock().unwrap().$field.push(value);
            }
        )*
    };
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of the named operation fail with an
    /// infrastructure error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_on(&self, operation: &'static str) {
        self.faults.lock().unwrap().always.insert(operation);
    }

    /// Makes only the `nth` call (1-based, counted over the store's
    /// lifetime) of the named operation fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_on_call(&self, operation: &'static str, nth: usize) {
        self.faults.lock().unwrap().on_call.insert(operation, nth);
    }

    /// Clears every injected failure of the named operation.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn recover(&self, operation: &'static str) {
        let mut faults = self.faults.lock().unwrap();
        faults.always.remove(operation);
        faults.on_call.remove(operation);
    }

    fn check(&self, operation: &'static str) -> Result<(), DomainError> {
        let mut faults = self.faults.lock().unwrap();
        let calls = faults.calls.entry(operation).or_default();
        *calls += 1;
        let call = *calls;
        if faults.always.contains(operation) || faults.on_call.get(operation) == Some(&call) {
            Err(DomainError::Infrastructure(format!(
                "{operation}: connection refused"
            )))
        } else {
            Ok(())
        }
    }

    seed! {
        /// Seeds a profile.
        add_profile(Profile) => profiles;
        /// Seeds a corporate account.
        add_corporate_account(CorporateAccount) => accounts;
        /// Seeds a module.
        add_module(MarketplaceModule) => modules;
        /// Seeds a lesson.
        add_lesson(Lesson) => lessons;
        /// Seeds a cart item.
        add_cart_item(CartItem) => cart;
        /// Seeds a promo code.
        add_promo_code(PromoCode) => promo_codes;
        /// Seeds an enrollment.
        add_enrollment(Enrollment) => enrollments;
        /// Seeds an activity response.
        add_activity_response(ActivityResponse) => responses;
        /// Seeds a certificate.
        add_certificate(Certificate) => certificates;
        /// Seeds a lesson completion without touching its enrollment.
        add_lesson_completion(LessonCompletion) => completions;
    }

    snapshot! {
        /// Returns all modules.
        modules -> MarketplaceModule => modules;
        /// Returns all lessons.
        lessons -> Lesson => lessons;
        /// Returns all cart items.
        cart_items -> CartItem => cart;
        /// Returns all promo codes.
        promo_codes -> PromoCode => promo_codes;
        /// Returns all recorded promo redemptions.
        promo_uses -> PromoCodeUse => promo_uses;
        /// Returns all revenue distributions.
        sales -> RecordedSale => sales;
        /// Returns all enrollments.
        enrollments -> Enrollment => enrollments;
        /// Returns all saved activity responses.
        activity_responses -> ActivityResponse => responses;
        /// Returns all legacy mirror writes.
        legacy_responses -> ActivityResponse => legacy_responses;
        /// Returns all lesson completions.
        completions -> LessonCompletion => completions;
        /// Returns all unlocked achievements.
        achievements -> UserAchievement => achievements;
        /// Returns all certificates.
        certificates -> Certificate => certificates;
        /// Returns all community memberships.
        memberships -> CommunityMember => members;
    }

    /// Returns a learner's stats, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn user_stats(&self, user_id: Uuid) -> Option<UserStats> {
        self.state.lock().unwrap().stats.get(&user_id).cloned()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, DomainError> {
        self.check("find_profile")?;
        let state = self.state.lock().unwrap();
        Ok(state.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn list_account_members(&self, account_id: Uuid) -> Result<Vec<Profile>, DomainError> {
        self.check("list_account_members")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .profiles
            .iter()
            .filter(|p| p.corporate_account_id == Some(account_id))
            .cloned()
            .collect())
    }

    async fn find_corporate_account(
        &self,
        account_id: Uuid,
    ) -> Result<Option<CorporateAccount>, DomainError> {
        self.check("find_corporate_account")?;
        let state = self.state.lock().unwrap();
        Ok(state.accounts.iter().find(|a| a.id == account_id).cloned())
    }
}

#[async_trait]
impl CommunityRepository for InMemoryStore {
    async fn find_community(&self, id: Uuid) -> Result<Option<Community>, DomainError> {
        self.check("find_community")?;
        let state = self.state.lock().unwrap();
        Ok(state.communities.iter().find(|c| c.id == id).cloned())
    }

    async fn find_community_by_slug(&self, slug: &str) -> Result<Option<Community>, DomainError> {
        self.check("find_community_by_slug")?;
        let state = self.state.lock().unwrap();
        Ok(state.communities.iter().find(|c| c.slug == slug).cloned())
    }

    async fn list_communities(
        &self,
        core_value: Option<CoreValue>,
    ) -> Result<Vec<Community>, DomainError> {
        self.check("list_communities")?;
        let state = self.state.lock().unwrap();
        let mut communities: Vec<Community> = state
            .communities
            .iter()
            .filter(|c| core_value.is_none_or(|v| c.core_values.contains(&v)))
            .cloned()
            .collect();
        communities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(communities)
    }

    async fn create_community(
        &self,
        community: &Community,
        founder: &CommunityMember,
    ) -> Result<(), DomainError> {
        self.check("create_community")?;
        let mut state = self.state.lock().unwrap();
        if state.communities.iter().any(|c| c.slug == community.slug) {
            return Err(DomainError::Conflict(format!(
                "slug already taken: {}",
                community.slug
            )));
        }
        state.communities.push(community.clone());
        state.members.push(founder.clone());
        Ok(())
    }

    async fn find_member(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CommunityMember>, DomainError> {
        self.check("find_member")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .members
            .iter()
            .find(|m| m.community_id == community_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, community_id: Uuid) -> Result<Vec<CommunityMember>, DomainError> {
        self.check("list_members")?;
        let state = self.state.lock().unwrap();
        let mut members: Vec<CommunityMember> = state
            .members
            .iter()
            .filter(|m| m.community_id == community_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }

    async fn add_member(&self, member: &CommunityMember) -> Result<(), DomainError> {
        self.check("add_member")?;
        let mut state = self.state.lock().unwrap();
        if state
            .members
            .iter()
            .any(|m| m.community_id == member.community_id && m.user_id == member.user_id)
        {
            return Err(DomainError::Conflict("already a member".to_owned()));
        }
        state.members.push(member.clone());
        if let Some(c) = state
            .communities
            .iter_mut()
            .find(|c| c.id == member.community_id)
        {
            c.member_count += 1;
        }
        Ok(())
    }

    async fn remove_member(&self, community_id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.check("remove_member")?;
        let mut state = self.state.lock().unwrap();
        let before = state.members.len();
        state
            .members
            .retain(|m| !(m.community_id == community_id && m.user_id == user_id));
        if state.members.len() < before {
            if let Some(c) = state.communities.iter_mut().find(|c| c.id == community_id) {
                c.member_count = (c.member_count - 1).max(0);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ModuleRepository for InMemoryStore {
    async fn find_module(&self, id: Uuid) -> Result<Option<MarketplaceModule>, DomainError> {
        self.check("find_module")?;
        let state = self.state.lock().unwrap();
        Ok(state.modules.iter().find(|m| m.id == id).cloned())
    }

    async fn list_modules(
        &self,
        status: ModuleStatus,
        core_value: Option<CoreValue>,
    ) -> Result<Vec<MarketplaceModule>, DomainError> {
        self.check("list_modules")?;
        let state = self.state.lock().unwrap();
        let mut modules: Vec<MarketplaceModule> = state
            .modules
            .iter()
            .filter(|m| m.status == status && core_value.is_none_or(|v| m.core_value == v))
            .cloned()
            .collect();
        modules.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(modules)
    }

    async fn insert_module(&self, module: &MarketplaceModule) -> Result<(), DomainError> {
        self.check("insert_module")?;
        self.state.lock().unwrap().modules.push(module.clone());
        Ok(())
    }

    async fn update_module(&self, module: &MarketplaceModule) -> Result<(), DomainError> {
        self.check("update_module")?;
        let mut state = self.state.lock().unwrap();
        let slot = state
            .modules
            .iter_mut()
            .find(|m| m.id == module.id)
            .ok_or_else(|| DomainError::not_found("module", module.id))?;
        *slot = module.clone();
        Ok(())
    }

    async fn list_lessons(&self, module_id: Uuid) -> Result<Vec<Lesson>, DomainError> {
        self.check("list_lessons")?;
        let state = self.state.lock().unwrap();
        let mut lessons: Vec<Lesson> = state
            .lessons
            .iter()
            .filter(|l| l.module_id == module_id)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.lesson_order);
        Ok(lessons)
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), DomainError> {
        self.check("insert_lesson")?;
        self.state.lock().unwrap().lessons.push(lesson.clone());
        Ok(())
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn list_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        self.check("list_cart")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .cart
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_cart_item(&self, item: &CartItem) -> Result<(), DomainError> {
        self.check("upsert_cart_item")?;
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .cart
            .iter_mut()
            .find(|i| i.user_id == item.user_id && i.module_id == item.module_id)
        {
            existing.employee_count = item.employee_count;
            existing.price_snapshot_cents = item.price_snapshot_cents;
            existing.added_at = item.added_at;
        } else {
            state.cart.push(item.clone());
        }
        Ok(())
    }

    async fn remove_cart_item(&self, user_id: Uuid, module_id: Uuid) -> Result<bool, DomainError> {
        self.check("remove_cart_item")?;
        let mut state = self.state.lock().unwrap();
        let before = state.cart.len();
        state
            .cart
            .retain(|i| !(i.user_id == user_id && i.module_id == module_id));
        Ok(state.cart.len() < before)
    }

    async fn clear_cart(&self, user_id: Uuid) -> Result<(), DomainError> {
        self.check("clear_cart")?;
        self.state
            .lock()
            .unwrap()
            .cart
            .retain(|i| i.user_id != user_id);
        Ok(())
    }
}

#[async_trait]
impl PromoCodeRepository for InMemoryStore {
    async fn find_promo_code(&self, code: &str) -> Result<Option<PromoCode>, DomainError> {
        self.check("find_promo_code")?;
        let state = self.state.lock().unwrap();
        Ok(state.promo_codes.iter().find(|p| p.code == code).cloned())
    }

    async fn record_promo_use(&self, redemption: &PromoCodeUse) -> Result<(), DomainError> {
        self.check("record_promo_use")?;
        let mut state = self.state.lock().unwrap();
        if let Some(promo) = state
            .promo_codes
            .iter_mut()
            .find(|p| p.code == redemption.code)
        {
            promo.current_uses += 1;
        }
        state.promo_uses.push(redemption.clone());
        Ok(())
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryStore {
    async fn existing_enrollees(
        &self,
        module_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, DomainError> {
        self.check("existing_enrollees")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .enrollments
            .iter()
            .filter(|e| e.module_id == module_id && user_ids.contains(&e.user_id))
            .map(|e| e.user_id)
            .collect())
    }

    async fn fulfill_item(&self, item: &ItemFulfillment) -> Result<u64, DomainError> {
        self.check("fulfill_item")?;
        let mut state = self.state.lock().unwrap();
        let community_module = state
            .modules
            .iter()
            .find(|m| m.id == item.module_id)
            .ok_or_else(|| DomainError::not_found("module", item.module_id))?
            .is_community_module();

        let mut inserted = 0;
        for new in &item.enrollments {
            if state
                .enrollments
                .iter()
                .any(|e| e.user_id == new.user_id && e.module_id == new.module_id)
            {
                continue;
            }
            state.enrollments.push(Enrollment {
                id: new.id,
                user_id: new.user_id,
                module_id: new.module_id,
                corporate_account_id: new.corporate_account_id,
                purchase_type: new.purchase_type,
                price_paid_cents: new.price_paid_cents,
                status: EnrollmentStatus::NotStarted,
                progress_percentage: 0,
                completed: false,
                completed_at: None,
                xp_earned: 0,
                purchased_at: new.purchased_at,
                last_accessed_at: None,
            });
            inserted += 1;
        }
        if inserted == 0 {
            return Ok(0);
        }

        if let Some(module) = state.modules.iter_mut().find(|m| m.id == item.module_id) {
            module.purchase_count += 1;
        }
        state.sales.push(RecordedSale {
            module_id: item.module_id,
            buyer_id: item.buyer_id,
            amount_cents: item.amount_cents,
            split: RevenueSplit::for_sale(item.amount_cents, community_module),
        });
        Ok(inserted)
    }
}

fn lesson_definition(lesson: &Lesson) -> LessonDefinition {
    LessonDefinition {
        id: lesson.id,
        module_id: lesson.module_id,
        lesson_order: lesson.lesson_order,
        title: lesson.title.clone(),
        xp_reward: lesson.xp_reward,
        activity_type: lesson.activity_type.clone(),
        config: ActivityConfig::from_json(&lesson.activity_config),
    }
}

#[async_trait]
impl LearningRepository for InMemoryStore {
    async fn list_enrollments(&self, user_id: Uuid) -> Result<Vec<Enrollment>, DomainError> {
        self.check("list_enrollments")?;
        let state = self.state.lock().unwrap();
        let mut enrollments: Vec<Enrollment> = state
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        enrollments.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(enrollments)
    }

    async fn find_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>, DomainError> {
        self.check("find_enrollment")?;
        let state = self.state.lock().unwrap();
        Ok(state.enrollments.iter().find(|e| e.id == id).cloned())
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), DomainError> {
        self.check("update_enrollment")?;
        let mut state = self.state.lock().unwrap();
        let slot = state
            .enrollments
            .iter_mut()
            .find(|e| e.id == enrollment.id)
            .ok_or_else(|| DomainError::not_found("enrollment", enrollment.id))?;
        *slot = enrollment.clone();
        Ok(())
    }

    async fn find_lesson(&self, lesson_id: Uuid) -> Result<Option<LessonDefinition>, DomainError> {
        self.check("find_lesson")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .lessons
            .iter()
            .find(|l| l.id == lesson_id)
            .map(lesson_definition))
    }

    async fn count_lessons(&self, module_id: Uuid) -> Result<i64, DomainError> {
        self.check("count_lessons")?;
        let state = self.state.lock().unwrap();
        let count = state
            .lessons
            .iter()
            .filter(|l| l.module_id == module_id)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn find_activity_response(
        &self,
        enrollment_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<ActivityResponse>, DomainError> {
        self.check("find_activity_response")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .responses
            .iter()
            .find(|r| r.enrollment_id == enrollment_id && r.lesson_id == lesson_id)
            .cloned())
    }

    async fn list_activity_responses(
        &self,
        enrollment_id: Uuid,
        lesson_id: Option<Uuid>,
    ) -> Result<Vec<ActivityResponse>, DomainError> {
        self.check("list_activity_responses")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .responses
            .iter()
            .filter(|r| r.enrollment_id == enrollment_id && lesson_id.is_none_or(|l| r.lesson_id == l))
            .cloned()
            .collect())
    }

    async fn upsert_activity_response(
        &self,
        response: &ActivityResponse,
    ) -> Result<(), DomainError> {
        self.check("upsert_activity_response")?;
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.responses.iter_mut().find(|r| {
            r.enrollment_id == response.enrollment_id && r.lesson_id == response.lesson_id
        }) {
            *slot = response.clone();
        } else {
            state.responses.push(response.clone());
        }
        Ok(())
    }

    async fn write_legacy_response(&self, response: &ActivityResponse) -> Result<(), DomainError> {
        self.check("write_legacy_response")?;
        self.state
            .lock()
            .unwrap()
            .legacy_responses
            .push(response.clone());
        Ok(())
    }

    async fn find_lesson_completion(
        &self,
        enrollment_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<LessonCompletion>, DomainError> {
        self.check("find_lesson_completion")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .completions
            .iter()
            .find(|c| c.enrollment_id == enrollment_id && c.lesson_id == lesson_id)
            .cloned())
    }

    async fn record_lesson_completion(
        &self,
        completion: &LessonCompletion,
        enrollment: &Enrollment,
    ) -> Result<bool, DomainError> {
        self.check("record_lesson_completion")?;
        let mut state = self.state.lock().unwrap();
        if state.completions.iter().any(|c| {
            c.enrollment_id == completion.enrollment_id && c.lesson_id == completion.lesson_id
        }) {
            return Ok(false);
        }
        let slot = state
            .enrollments
            .iter_mut()
            .find(|e| e.id == enrollment.id)
            .ok_or_else(|| DomainError::not_found("enrollment", enrollment.id))?;
        *slot = enrollment.clone();
        state.completions.push(completion.clone());
        Ok(true)
    }

    async fn count_lesson_completions(&self, enrollment_id: Uuid) -> Result<i64, DomainError> {
        self.check("count_lesson_completions")?;
        let state = self.state.lock().unwrap();
        let count = state
            .completions
            .iter()
            .filter(|c| c.enrollment_id == enrollment_id)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl GamificationRepository for InMemoryStore {
    async fn find_user_stats(&self, user_id: Uuid) -> Result<Option<UserStats>, DomainError> {
        self.check("find_user_stats")?;
        Ok(self.state.lock().unwrap().stats.get(&user_id).cloned())
    }

    async fn save_user_stats(&self, stats: &UserStats) -> Result<(), DomainError> {
        self.check("save_user_stats")?;
        self.state
            .lock()
            .unwrap()
            .stats
            .insert(stats.user_id, stats.clone());
        Ok(())
    }

    async fn list_achievements(&self, user_id: Uuid) -> Result<Vec<UserAchievement>, DomainError> {
        self.check("list_achievements")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .achievements
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn unlock_achievement(&self, achievement: &UserAchievement) -> Result<(), DomainError> {
        self.check("unlock_achievement")?;
        let mut state = self.state.lock().unwrap();
        if !state.achievements.iter().any(|a| {
            a.user_id == achievement.user_id && a.achievement == achievement.achievement
        }) {
            state.achievements.push(achievement.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl CertificateRepository for InMemoryStore {
    async fn find_certifiable_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> Result<Option<CertifiableEnrollment>, DomainError> {
        self.check("find_certifiable_enrollment")?;
        let state = self.state.lock().unwrap();
        let Some(enrollment) = state.enrollments.iter().find(|e| e.id == enrollment_id) else {
            return Ok(None);
        };
        Ok(state
            .modules
            .iter()
            .find(|m| m.id == enrollment.module_id)
            .map(|module| CertifiableEnrollment {
                id: enrollment.id,
                user_id: enrollment.user_id,
                module_id: module.id,
                completed: enrollment.completed,
                xp_earned: enrollment.xp_earned,
                module_title: module.title.clone(),
                core_value: module.core_value,
            }))
    }

    async fn find_certificate_by_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> Result<Option<Certificate>, DomainError> {
        self.check("find_certificate_by_enrollment")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .certificates
            .iter()
            .find(|c| c.enrollment_id == enrollment_id)
            .cloned())
    }

    async fn find_certificate_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Certificate>, DomainError> {
        self.check("find_certificate_by_code")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .certificates
            .iter()
            .find(|c| c.verification_code == code)
            .cloned())
    }

    async fn insert_certificate(&self, certificate: &Certificate) -> Result<(), DomainError> {
        self.check("insert_certificate")?;
        let mut state = self.state.lock().unwrap();
        if state
            .certificates
            .iter()
            .any(|c| c.verification_code == certificate.verification_code)
        {
            return Err(DomainError::Conflict(
                "verification code already taken".to_owned(),
            ));
        }
        if state
            .certificates
            .iter()
            .any(|c| c.enrollment_id == certificate.enrollment_id)
        {
            return Err(DomainError::Conflict(
                "enrollment already has a certificate".to_owned(),
            ));
        }
        state.certificates.push(certificate.clone());
        Ok(())
    }
}

#[async_trait]
impl ReportRepository for InMemoryStore {
    async fn list_employee_enrollments(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<EnrollmentRow>, DomainError> {
        self.check("list_employee_enrollments")?;
        let state = self.state.lock().unwrap();
        let members = state.member_ids(account_id);
        Ok(state
            .enrollments
            .iter()
            .filter(|e| members.contains(&e.user_id))
            .map(|e| {
                let lessons = state
                    .completions
                    .iter()
                    .filter(|c| c.enrollment_id == e.id)
                    .count();
                EnrollmentRow {
                    user_id: e.user_id,
                    module_id: e.module_id,
                    status: e.status.as_str().to_owned(),
                    progress_percentage: e.progress_percentage,
                    completed: e.completed,
                    xp_earned: e.xp_earned,
                    lessons_completed: i64::try_from(lessons).unwrap_or(i64::MAX),
                }
            })
            .collect())
    }

    async fn list_modules_by_ids(&self, ids: &[Uuid]) -> Result<Vec<ModuleRow>, DomainError> {
        self.check("list_modules_by_ids")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .modules
            .iter()
            .filter(|m| ids.contains(&m.id))
            .map(|m| ModuleRow {
                id: m.id,
                title: m.title.clone(),
                core_value: m.core_value,
            })
            .collect())
    }

    async fn list_employee_tool_results(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<ToolResultRow>, DomainError> {
        self.check("list_employee_tool_results")?;
        let state = self.state.lock().unwrap();
        let members = state.member_ids(account_id);
        Ok(state
            .responses
            .iter()
            .filter(|r| members.contains(&r.user_id))
            .flat_map(|r| {
                r.tool_results.iter().map(|(name, result)| ToolResultRow {
                    user_id: r.user_id,
                    tool_name: name.clone(),
                    result: result.clone(),
                })
            })
            .collect())
    }
}
