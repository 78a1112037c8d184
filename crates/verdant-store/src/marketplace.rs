use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use tracing::debug;
use uuid::Uuid;
use verdant_core::core_value::CoreValue;
use verdant_core::error::DomainError;
use verdant_marketplace::domain::cart::CartItem;
use verdant_marketplace::domain::module::{Lesson, MarketplaceModule, ModuleStatus};
use verdant_marketplace::domain::promo::PromoCode;
use verdant_marketplace::domain::purchase::{ItemFulfillment, PromoCodeUse};
use verdant_marketplace::domain::repository::{
    CartRepository, ModuleRepository, PromoCodeRepository, PurchaseRepository,
};

use crate::PgStore;
use crate::error::{db_error, parse_column};

const MODULE_COLUMNS: &str = "id, title, description, core_value, creator_community_id, \
     creator_user_id, price_cents, status, review_notes, published_at, purchase_count, \
     created_at, updated_at";

const LESSON_COLUMNS: &str =
    "id, module_id, lesson_order, title, content, xp_reward, activity_type, activity_config";

const PROMO_COLUMNS: &str = "id, code, discount_type, discount_value, max_uses, current_uses, \
     valid_from, valid_until, minimum_purchase_cents, active";

fn module_from_row(row: &PgRow) -> Result<MarketplaceModule, DomainError> {
    Ok(MarketplaceModule {
        id: row.try_get("id").map_err(db_error)?,
        title: row.try_get("title").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        core_value: parse_column(row, "core_value")?,
        creator_community_id: row.try_get("creator_community_id").map_err(db_error)?,
        creator_user_id: row.try_get("creator_user_id").map_err(db_error)?,
        price_cents: row.try_get("price_cents").map_err(db_error)?,
        status: parse_column(row, "status")?,
        review_notes: row.try_get("review_notes").map_err(db_error)?,
        published_at: row.try_get("published_at").map_err(db_error)?,
        purchase_count: row.try_get("purchase_count").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
        updated_at: row.try_get("updated_at").map_err(db_error)?,
    })
}

pub(crate) fn lesson_from_row(row: &PgRow) -> Result<Lesson, DomainError> {
    Ok(Lesson {
        id: row.try_get("id").map_err(db_error)?,
        module_id: row.try_get("module_id").map_err(db_error)?,
        lesson_order: row.try_get("lesson_order").map_err(db_error)?,
        title: row.try_get("title").map_err(db_error)?,
        content: row.try_get("content").map_err(db_error)?,
        xp_reward: row.try_get("xp_reward").map_err(db_error)?,
        activity_type: row.try_get("activity_type").map_err(db_error)?,
        activity_config: row.try_get("activity_config").map_err(db_error)?,
    })
}

fn cart_item_from_row(row: &PgRow) -> Result<CartItem, DomainError> {
    Ok(CartItem {
        id: row.try_get("id").map_err(db_error)?,
        user_id: row.try_get("user_id").map_err(db_error)?,
        module_id: row.try_get("module_id").map_err(db_error)?,
        employee_count: row.try_get("employee_count").map_err(db_error)?,
        price_snapshot_cents: row.try_get("price_snapshot_cents").map_err(db_error)?,
        added_at: row.try_get("added_at").map_err(db_error)?,
    })
}

fn promo_from_row(row: &PgRow) -> Result<PromoCode, DomainError> {
    Ok(PromoCode {
        id: row.try_get("id").map_err(db_error)?,
        code: row.try_get("code").map_err(db_error)?,
        discount_type: parse_column(row, "discount_type")?,
        discount_value: row.try_get("discount_value").map_err(db_error)?,
        max_uses: row.try_get("max_uses").map_err(db_error)?,
        current_uses: row.try_get("current_uses").map_err(db_error)?,
        valid_from: row.try_get("valid_from").map_err(db_error)?,
        valid_until: row.try_get("valid_until").map_err(db_error)?,
        minimum_purchase_cents: row.try_get("minimum_purchase_cents").map_err(db_error)?,
        active: row.try_get("active").map_err(db_error)?,
    })
}

#[async_trait]
impl ModuleRepository for PgStore {
    async fn find_module(&self, id: Uuid) -> Result<Option<MarketplaceModule>, DomainError> {
        sqlx::query(&format!(
            "SELECT {MODULE_COLUMNS} FROM marketplace_modules WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(module_from_row)
        .transpose()
    }

    async fn list_modules(
        &self,
        status: ModuleStatus,
        core_value: Option<CoreValue>,
    ) -> Result<Vec<MarketplaceModule>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {MODULE_COLUMNS} FROM marketplace_modules \
             WHERE status = $1 AND ($2::text IS NULL OR core_value = $2) \
             ORDER BY created_at DESC"
        ))
        .bind(status.as_str())
        .bind(core_value.map(CoreValue::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(module_from_row).collect()
    }

    async fn insert_module(&self, module: &MarketplaceModule) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO marketplace_modules ({MODULE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(module.id)
        .bind(&module.title)
        .bind(&module.description)
        .bind(module.core_value.as_str())
        .bind(module.creator_community_id)
        .bind(module.creator_user_id)
        .bind(module.price_cents)
        .bind(module.status.as_str())
        .bind(&module.review_notes)
        .bind(module.published_at)
        .bind(module.purchase_count)
        .bind(module.created_at)
        .bind(module.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn update_module(&self, module: &MarketplaceModule) -> Result<(), DomainError> {
        let updated = sqlx::query(
            "UPDATE marketplace_modules \
             SET title = $2, description = $3, price_cents = $4, status = $5, \
                 review_notes = $6, published_at = $7, updated_at = $8 \
             WHERE id = $1",
        )
        .bind(module.id)
        .bind(&module.title)
        .bind(&module.description)
        .bind(module.price_cents)
        .bind(module.status.as_str())
        .bind(&module.review_notes)
        .bind(module.published_at)
        .bind(module.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?
        .rows_affected();
        if updated == 0 {
            return Err(DomainError::not_found("module", module.id));
        }
        Ok(())
    }

    async fn list_lessons(&self, module_id: Uuid) -> Result<Vec<Lesson>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {LESSON_COLUMNS} FROM module_lessons \
             WHERE module_id = $1 ORDER BY lesson_order"
        ))
        .bind(module_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(lesson_from_row).collect()
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO module_lessons ({LESSON_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(lesson.id)
        .bind(lesson.module_id)
        .bind(lesson.lesson_order)
        .bind(&lesson.title)
        .bind(&lesson.content)
        .bind(lesson.xp_reward)
        .bind(&lesson.activity_type)
        .bind(&lesson.activity_config)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn list_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, user_id, module_id, employee_count, price_snapshot_cents, added_at \
             FROM cart_items WHERE user_id = $1 ORDER BY added_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(cart_item_from_row).collect()
    }

    async fn upsert_cart_item(&self, item: &CartItem) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO cart_items \
             (id, user_id, module_id, employee_count, price_snapshot_cents, added_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, module_id) DO UPDATE \
             SET employee_count = EXCLUDED.employee_count, \
                 price_snapshot_cents = EXCLUDED.price_snapshot_cents, \
                 added_at = EXCLUDED.added_at",
        )
        .bind(item.id)
        .bind(item.user_id)
        .bind(item.module_id)
        .bind(item.employee_count)
        .bind(item.price_snapshot_cents)
        .bind(item.added_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn remove_cart_item(&self, user_id: Uuid, module_id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND module_id = $2")
            .bind(user_id)
            .bind(module_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn clear_cart(&self, user_id: Uuid) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl PromoCodeRepository for PgStore {
    async fn find_promo_code(&self, code: &str) -> Result<Option<PromoCode>, DomainError> {
        sqlx::query(&format!(
            "SELECT {PROMO_COLUMNS} FROM promo_codes WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(promo_from_row)
        .transpose()
    }

    async fn record_promo_use(&self, redemption: &PromoCodeUse) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let promo_id: Uuid = sqlx::query(
            "UPDATE promo_codes SET current_uses = current_uses + 1 \
             WHERE code = $1 RETURNING id",
        )
        .bind(&redemption.code)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .ok_or_else(|| DomainError::not_found("promo code", &redemption.code))?
        .try_get("id")
        .map_err(db_error)?;
        sqlx::query(
            "INSERT INTO promo_code_uses \
             (promo_code_id, user_id, stripe_session_id, discount_cents, used_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(promo_id)
        .bind(redemption.user_id)
        .bind(&redemption.stripe_session_id)
        .bind(redemption.discount_cents)
        .bind(redemption.used_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        tx.commit().await.map_err(db_error)
    }
}

#[async_trait]
impl PurchaseRepository for PgStore {
    async fn existing_enrollees(
        &self,
        module_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, DomainError> {
        let rows = sqlx::query(
            "SELECT user_id FROM course_enrollments \
             WHERE module_id = $1 AND user_id = ANY($2)",
        )
        .bind(module_id)
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter()
            .map(|row| row.try_get("user_id").map_err(db_error))
            .collect()
    }

    async fn fulfill_item(&self, item: &ItemFulfillment) -> Result<u64, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let mut inserted = 0;
        for enrollment in &item.enrollments {
            inserted += sqlx::query(
                "INSERT INTO course_enrollments \
                 (id, user_id, module_id, corporate_account_id, purchase_type, \
                  price_paid_cents, purchased_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 ON CONFLICT (user_id, module_id) DO NOTHING",
            )
            .bind(enrollment.id)
            .bind(enrollment.user_id)
            .bind(enrollment.module_id)
            .bind(enrollment.corporate_account_id)
            .bind(enrollment.purchase_type.as_str())
            .bind(enrollment.price_paid_cents)
            .bind(enrollment.purchased_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?
            .rows_affected();
        }

        if inserted == 0 {
            // A concurrent delivery fulfilled this line first.
            tx.rollback().await.map_err(db_error)?;
            debug!(module_id = %item.module_id, "line already fulfilled, nothing written");
            return Ok(0);
        }

        sqlx::query("SELECT process_module_sale($1, $2, $3, false)")
            .bind(item.module_id)
            .bind(item.buyer_id)
            .bind(item.amount_cents)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        debug!(module_id = %item.module_id, inserted, "item fulfilled");
        Ok(inserted)
    }
}
