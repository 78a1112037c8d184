use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;
use verdant_community::domain::model::{Community, CommunityMember};
use verdant_community::domain::repository::CommunityRepository;
use verdant_core::core_value::CoreValue;
use verdant_core::error::DomainError;

use crate::PgStore;
use crate::error::{db_error, parse_column};

const COMMUNITY_COLUMNS: &str =
    "id, name, slug, description, core_values, founder_id, member_count, created_at";

fn community_from_row(row: &PgRow) -> Result<Community, DomainError> {
    let core_values = row
        .try_get::<Vec<String>, _>("core_values")
        .map_err(db_error)?
        .iter()
        .map(|v| v.parse::<CoreValue>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Community {
        id: row.try_get("id").map_err(db_error)?,
        name: row.try_get("name").map_err(db_error)?,
        slug: row.try_get("slug").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        core_values,
        founder_id: row.try_get("founder_id").map_err(db_error)?,
        member_count: row.try_get("member_count").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
    })
}

fn member_from_row(row: &PgRow) -> Result<CommunityMember, DomainError> {
    Ok(CommunityMember {
        community_id: row.try_get("community_id").map_err(db_error)?,
        user_id: row.try_get("user_id").map_err(db_error)?,
        role: parse_column(row, "role")?,
        joined_at: row.try_get("joined_at").map_err(db_error)?,
    })
}

#[async_trait]
impl CommunityRepository for PgStore {
    async fn find_community(&self, id: Uuid) -> Result<Option<Community>, DomainError> {
        sqlx::query(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(community_from_row)
        .transpose()
    }

    async fn find_community_by_slug(&self, slug: &str) -> Result<Option<Community>, DomainError> {
        sqlx::query(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(community_from_row)
        .transpose()
    }

    async fn list_communities(
        &self,
        core_value: Option<CoreValue>,
    ) -> Result<Vec<Community>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities \
             WHERE $1::text IS NULL OR $1 = ANY(core_values) \
             ORDER BY created_at DESC"
        ))
        .bind(core_value.map(CoreValue::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(community_from_row).collect()
    }

    async fn create_community(
        &self,
        community: &Community,
        founder: &CommunityMember,
    ) -> Result<(), DomainError> {
        let core_values: Vec<String> = community
            .core_values
            .iter()
            .map(|v| v.as_str().to_owned())
            .collect();

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        sqlx::query(
            "INSERT INTO communities \
             (id, name, slug, description, core_values, founder_id, member_count, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(community.id)
        .bind(&community.name)
        .bind(&community.slug)
        .bind(&community.description)
        .bind(&core_values)
        .bind(community.founder_id)
        .bind(community.member_count)
        .bind(community.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        sqlx::query(
            "INSERT INTO community_members (community_id, user_id, role, joined_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(founder.community_id)
        .bind(founder.user_id)
        .bind(founder.role.as_str())
        .bind(founder.joined_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        tx.commit().await.map_err(db_error)
    }

    async fn find_member(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CommunityMember>, DomainError> {
        sqlx::query(
            "SELECT community_id, user_id, role, joined_at FROM community_members \
             WHERE community_id = $1 AND user_id = $2",
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(member_from_row)
        .transpose()
    }

    async fn list_members(&self, community_id: Uuid) -> Result<Vec<CommunityMember>, DomainError> {
        let rows = sqlx::query(
            "SELECT community_id, user_id, role, joined_at FROM community_members \
             WHERE community_id = $1 ORDER BY joined_at",
        )
        .bind(community_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(member_from_row).collect()
    }

    async fn add_member(&self, member: &CommunityMember) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        sqlx::query(
            "INSERT INTO community_members (community_id, user_id, role, joined_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(member.community_id)
        .bind(member.user_id)
        .bind(member.role.as_str())
        .bind(member.joined_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        sqlx::query("UPDATE communities SET member_count = member_count + 1 WHERE id = $1")
            .bind(member.community_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)
    }

    async fn remove_member(&self, community_id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let deleted = sqlx::query(
            "DELETE FROM community_members WHERE community_id = $1 AND user_id = $2",
        )
        .bind(community_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected();
        if deleted > 0 {
            sqlx::query(
                "UPDATE communities SET member_count = GREATEST(member_count - 1, 0) \
                 WHERE id = $1",
            )
            .bind(community_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }
        tx.commit().await.map_err(db_error)
    }
}
