//! Persistence contract for the Certificates context.

use async_trait::async_trait;
use uuid::Uuid;
use verdant_core::core_value::CoreValue;
use verdant_core::error::DomainError;

use super::certificate::Certificate;

/// The enrollment facts a certificate is issued from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertifiableEnrollment {
    /// Enrollment id.
    pub id: Uuid,
    /// Learner.
    pub user_id: Uuid,
    /// Module.
    pub module_id: Uuid,
    /// Whether every lesson is complete.
    pub completed: bool,
    /// XP earned in the module.
    pub xp_earned: i64,
    /// Module title.
    pub module_title: String,
    /// Module core value.
    pub core_value: CoreValue,
}

/// Repository for certificates.
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Loads an enrollment with its module, for issuing.
    async fn find_certifiable_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> Result<Option<CertifiableEnrollment>, DomainError>;

    /// Loads the certificate of an enrollment.
    async fn find_certificate_by_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> Result<Option<Certificate>, DomainError>;

    /// Loads a certificate by its normalized verification code.
    async fn find_certificate_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Certificate>, DomainError>;

    /// Inserts a certificate. A taken verification code, or an enrollment
    /// that already has a certificate, is reported as `DomainError::Conflict`.
    async fn insert_certificate(&self, certificate: &Certificate) -> Result<(), DomainError>;
}
