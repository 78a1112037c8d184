//! Shared application state.

use std::sync::{Arc, Mutex};

use verdant_certificates::domain::repository::CertificateRepository;
use verdant_community::domain::repository::CommunityRepository;
use verdant_core::clock::Clock;
use verdant_core::profile::ProfileRepository;
use verdant_core::rng::DeterministicRng;
use verdant_learning::application::LearningSettings;
use verdant_learning::domain::repository::{GamificationRepository, LearningRepository};
use verdant_marketplace::domain::repository::{
    CartRepository, CheckoutGateway, ModuleRepository, PromoCodeRepository, PurchaseRepository,
};
use verdant_notifications::Mailer;
use verdant_reporting::domain::repository::ReportRepository;

use crate::auth::TokenVerifier;

/// Side-effecting collaborators injected into the state.
pub struct Services {
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Random source for verification codes.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Email delivery.
    pub mailer: Arc<dyn Mailer>,
    /// Hosted checkout provider.
    pub gateway: Arc<dyn CheckoutGateway>,
}

/// Values that do not change after startup.
#[derive(Clone)]
pub struct Settings {
    /// Public base URL, without a trailing slash.
    pub base_url: String,
    /// Secret used to verify webhook signatures.
    pub webhook_secret: String,
    /// Secret used to verify access tokens.
    pub jwt_secret: String,
    /// Learning thresholds and switches.
    pub learning: LearningSettings,
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Random source for verification codes.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Email delivery.
    pub mailer: Arc<dyn Mailer>,
    /// Hosted checkout provider.
    pub gateway: Arc<dyn CheckoutGateway>,
    /// Profiles and corporate accounts.
    pub profiles: Arc<dyn ProfileRepository>,
    /// Communities and memberships.
    pub communities: Arc<dyn CommunityRepository>,
    /// Marketplace modules and lessons.
    pub modules: Arc<dyn ModuleRepository>,
    /// Shopping carts.
    pub carts: Arc<dyn CartRepository>,
    /// Promo codes.
    pub promos: Arc<dyn PromoCodeRepository>,
    /// Purchase fulfillment.
    pub purchases: Arc<dyn PurchaseRepository>,
    /// Enrollments, responses and completions.
    pub learning: Arc<dyn LearningRepository>,
    /// XP, streaks and achievements.
    pub gamification: Arc<dyn GamificationRepository>,
    /// Certificates.
    pub certificates: Arc<dyn CertificateRepository>,
    /// ESG report rows.
    pub reports: Arc<dyn ReportRepository>,
    /// Access-token verifier.
    pub tokens: Arc<TokenVerifier>,
    /// Startup settings.
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create new application state backed by one store implementing every
    /// repository.
    #[must_use]
    pub fn new<S>(store: Arc<S>, services: Services, settings: Settings) -> Self
    where
        S: ProfileRepository
            + CommunityRepository
            + ModuleRepository
            + CartRepository
            + PromoCodeRepository
            + PurchaseRepository
            + LearningRepository
            + GamificationRepository
            + CertificateRepository
            + ReportRepository
            + 'static,
    {
        Self {
            clock: services.clock,
            rng: services.rng,
            mailer: services.mailer,
            gateway: services.gateway,
            profiles: store.clone(),
            communities: store.clone(),
            modules: store.clone(),
            carts: store.clone(),
            promos: store.clone(),
            purchases: store.clone(),
            learning: store.clone(),
            gamification: store.clone(),
            certificates: store.clone(),
            reports: store,
            tokens: Arc::new(TokenVerifier::new(&settings.jwt_secret)),
            settings: Arc::new(settings),
        }
    }
}
