use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;
use verdant_certificates::domain::certificate::Certificate;
use verdant_certificates::domain::repository::{CertifiableEnrollment, CertificateRepository};
use verdant_core::error::DomainError;

use crate::PgStore;
use crate::error::{db_error, parse_column};

const CERTIFICATE_COLUMNS: &str = "id, enrollment_id, user_id, module_id, holder_name, \
     module_title, core_value, verification_code, xp_earned, issued_at";

fn certificate_from_row(row: &PgRow) -> Result<Certificate, DomainError> {
    Ok(Certificate {
        id: row.try_get("id").map_err(db_error)?,
        enrollment_id: row.try_get("enrollment_id").map_err(db_error)?,
        user_id: row.try_get("user_id").map_err(db_error)?,
        module_id: row.try_get("module_id").map_err(db_error)?,
        holder_name: row.try_get("holder_name").map_err(db_error)?,
        module_title: row.try_get("module_title").map_err(db_error)?,
        core_value: parse_column(row, "core_value")?,
        verification_code: row.try_get("verification_code").map_err(db_error)?,
        xp_earned: row.try_get("xp_earned").map_err(db_error)?,
        issued_at: row.try_get("issued_at").map_err(db_error)?,
    })
}

#[async_trait]
impl CertificateRepository for PgStore {
    async fn find_certifiable_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> Result<Option<CertifiableEnrollment>, DomainError> {
        let row = sqlx::query(
            "SELECT e.id, e.user_id, e.module_id, e.completed, e.xp_earned, \
                    m.title, m.core_value \
             FROM course_enrollments e \
             JOIN marketplace_modules m ON m.id = e.module_id \
             WHERE e.id = $1",
        )
        .bind(enrollment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(|row| {
            Ok(CertifiableEnrollment {
                id: row.try_get("id").map_err(db_error)?,
                user_id: row.try_get("user_id").map_err(db_error)?,
                module_id: row.try_get("module_id").map_err(db_error)?,
                completed: row.try_get("completed").map_err(db_error)?,
                xp_earned: row.try_get("xp_earned").map_err(db_error)?,
                module_title: row.try_get("title").map_err(db_error)?,
                core_value: parse_column(&row, "core_value")?,
            })
        })
        .transpose()
    }

    async fn find_certificate_by_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> Result<Option<Certificate>, DomainError> {
        sqlx::query(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE enrollment_id = $1"
        ))
        .bind(enrollment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(certificate_from_row)
        .transpose()
    }

    async fn find_certificate_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Certificate>, DomainError> {
        sqlx::query(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE verification_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(certificate_from_row)
        .transpose()
    }

    async fn insert_certificate(&self, certificate: &Certificate) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO certificates ({CERTIFICATE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(certificate.id)
        .bind(certificate.enrollment_id)
        .bind(certificate.user_id)
        .bind(certificate.module_id)
        .bind(&certificate.holder_name)
        .bind(&certificate.module_title)
        .bind(certificate.core_value.as_str())
        .bind(&certificate.verification_code)
        .bind(certificate.xp_earned)
        .bind(certificate.issued_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}
