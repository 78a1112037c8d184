use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;
use verdant_core::error::DomainError;
use verdant_core::profile::{CorporateAccount, Profile, ProfileRepository};

use crate::PgStore;
use crate::error::{db_error, parse_column, parse_optional};

const PROFILE_COLUMNS: &str =
    "id, email, full_name, role, corporate_account_id, corporate_role";

fn profile_from_row(row: &PgRow) -> Result<Profile, DomainError> {
    Ok(Profile {
        id: row.try_get("id").map_err(db_error)?,
        email: row.try_get("email").map_err(db_error)?,
        full_name: row.try_get("full_name").map_err(db_error)?,
        role: parse_column(row, "role")?,
        corporate_account_id: row.try_get("corporate_account_id").map_err(db_error)?,
        corporate_role: parse_optional(row, "corporate_role")?,
    })
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, DomainError> {
        sqlx::query(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(profile_from_row)
            .transpose()
    }

    async fn list_account_members(&self, account_id: Uuid) -> Result<Vec<Profile>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles \
             WHERE corporate_account_id = $1 ORDER BY created_at"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(profile_from_row).collect()
    }

    async fn find_corporate_account(
        &self,
        account_id: Uuid,
    ) -> Result<Option<CorporateAccount>, DomainError> {
        let row = sqlx::query("SELECT id, company_name FROM corporate_accounts WHERE id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(|row| {
            Ok(CorporateAccount {
                id: row.try_get("id").map_err(db_error)?,
                company_name: row.try_get("company_name").map_err(db_error)?,
            })
        })
        .transpose()
    }
}
