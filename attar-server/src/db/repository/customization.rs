//! Customization Repository

use super::{RepoError, RepoResult};
use shared::models::{
    BottleSelection, BottleSize, Customization, CustomizationCreate, CustomizationStatus,
    FragranceSelection, LabelSelection, PriceBreakdown,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

const SELECT: &str = "SELECT id, user_id, name, fragrance_type, intensity, specific_notes, \
     bottle_style, bottle_color, bottle_size, bottle_material, label_text, label_font, \
     label_color, packaging, quantity, base_price, bottle_upgrade, fragrance_upgrade, \
     material_upgrade, packaging_upgrade, label_customization, total_price, status, image, \
     created_at, updated_at FROM customization";

/// Flat row shape; converted into the nested model on read
#[derive(Debug, sqlx::FromRow)]
struct CustomizationRow {
    id: i64,
    user_id: i64,
    name: String,
    fragrance_type: String,
    intensity: String,
    specific_notes: String,
    bottle_style: String,
    bottle_color: String,
    bottle_size: i64,
    bottle_material: String,
    label_text: Option<String>,
    label_font: String,
    label_color: Option<String>,
    packaging: String,
    quantity: i64,
    base_price: f64,
    bottle_upgrade: f64,
    fragrance_upgrade: f64,
    material_upgrade: f64,
    packaging_upgrade: f64,
    label_customization: f64,
    total_price: f64,
    status: String,
    image: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<CustomizationRow> for Customization {
    type Error = RepoError;

    fn try_from(row: CustomizationRow) -> Result<Self, Self::Error> {
        let specific_notes: Vec<String> = serde_json::from_str(&row.specific_notes)
            .map_err(|e| RepoError::Database(format!("corrupted specific_notes: {e}")))?;
        Ok(Customization {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            fragrance: FragranceSelection {
                fragrance_type: row.fragrance_type.parse()?,
                intensity: row.intensity.parse()?,
                specific_notes,
            },
            bottle: BottleSelection {
                style: row.bottle_style.parse()?,
                color: row.bottle_color,
                size: BottleSize::try_from(row.bottle_size as u16)
                    .map_err(|e| RepoError::Database(format!("corrupted bottle_size: {e}")))?,
                material: row.bottle_material.parse()?,
            },
            label: LabelSelection {
                text: row.label_text,
                font: row.label_font.parse()?,
                color: row.label_color,
            },
            packaging: row.packaging.parse()?,
            quantity: row.quantity,
            price_breakdown: PriceBreakdown {
                base_price: row.base_price,
                bottle_upgrade: row.bottle_upgrade,
                fragrance_upgrade: row.fragrance_upgrade,
                material_upgrade: row.material_upgrade,
                packaging_upgrade: row.packaging_upgrade,
                label_customization: row.label_customization,
            },
            total_price: row.total_price,
            status: row.status.parse()?,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Create a priced customization
pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    data: &CustomizationCreate,
    breakdown: &PriceBreakdown,
    total_price: f64,
    status: CustomizationStatus,
) -> RepoResult<Customization> {
    let id = snowflake_id();
    let now = now_millis();
    let notes = serde_json::to_string(&data.selection.fragrance.specific_notes)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    sqlx::query(
        "INSERT INTO customization (id, user_id, name, fragrance_type, intensity, \
         specific_notes, bottle_style, bottle_color, bottle_size, bottle_material, \
         label_text, label_font, label_color, packaging, quantity, base_price, \
         bottle_upgrade, fragrance_upgrade, material_upgrade, packaging_upgrade, \
         label_customization, total_price, status, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
         ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?24)",
    )
    .bind(id)
    .bind(user_id)
    .bind(&data.name)
    .bind(data.selection.fragrance.fragrance_type.as_str())
    .bind(data.selection.fragrance.intensity.as_str())
    .bind(notes)
    .bind(data.selection.bottle.style.as_str())
    .bind(&data.selection.bottle.color)
    .bind(data.selection.bottle.size.millilitres() as i64)
    .bind(data.selection.bottle.material.as_str())
    .bind(&data.selection.label.text)
    .bind(data.selection.label.font.as_str())
    .bind(&data.selection.label.color)
    .bind(data.selection.packaging.as_str())
    .bind(data.quantity)
    .bind(breakdown.base_price)
    .bind(breakdown.bottle_upgrade)
    .bind(breakdown.fragrance_upgrade)
    .bind(breakdown.material_upgrade)
    .bind(breakdown.packaging_upgrade)
    .bind(breakdown.label_customization)
    .bind(total_price)
    .bind(status.as_str())
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create customization".into()))
}

/// Find a customization by id
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Customization>> {
    let sql = format!("{SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, CustomizationRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Customization::try_from).transpose()
}

/// Find all customizations for a user, newest first
pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Customization>> {
    let sql = format!("{SELECT} WHERE user_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, CustomizationRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(Customization::try_from).collect()
}

/// Persist the mutable fields of a customization
pub async fn update(pool: &SqlitePool, c: &Customization) -> RepoResult<()> {
    let now = now_millis();
    let notes = serde_json::to_string(&c.fragrance.specific_notes)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    let rows = sqlx::query(
        "UPDATE customization SET name = ?1, fragrance_type = ?2, intensity = ?3, \
         specific_notes = ?4, bottle_style = ?5, bottle_color = ?6, bottle_size = ?7, \
         bottle_material = ?8, label_text = ?9, label_font = ?10, label_color = ?11, \
         packaging = ?12, quantity = ?13, base_price = ?14, bottle_upgrade = ?15, \
         fragrance_upgrade = ?16, material_upgrade = ?17, packaging_upgrade = ?18, \
         label_customization = ?19, total_price = ?20, status = ?21, image = ?22, \
         updated_at = ?23 WHERE id = ?24",
    )
    .bind(&c.name)
    .bind(c.fragrance.fragrance_type.as_str())
    .bind(c.fragrance.intensity.as_str())
    .bind(notes)
    .bind(c.bottle.style.as_str())
    .bind(&c.bottle.color)
    .bind(c.bottle.size.millilitres() as i64)
    .bind(c.bottle.material.as_str())
    .bind(&c.label.text)
    .bind(c.label.font.as_str())
    .bind(&c.label.color)
    .bind(c.packaging.as_str())
    .bind(c.quantity)
    .bind(c.price_breakdown.base_price)
    .bind(c.price_breakdown.bottle_upgrade)
    .bind(c.price_breakdown.fragrance_upgrade)
    .bind(c.price_breakdown.material_upgrade)
    .bind(c.price_breakdown.packaging_upgrade)
    .bind(c.price_breakdown.label_customization)
    .bind(c.total_price)
    .bind(c.status.as_str())
    .bind(&c.image)
    .bind(now)
    .bind(c.id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Customization {} not found",
            c.id
        )));
    }
    Ok(())
}

/// Delete a customization
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM customization WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Transition a customization to `ordered` within the caller's transaction
pub async fn mark_ordered(conn: &mut SqliteConnection, id: i64) -> RepoResult<()> {
    sqlx::query("UPDATE customization SET status = 'ordered', updated_at = ? WHERE id = ?")
        .bind(now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_pool;
    use shared::models::{
        BottleMaterial, BottleStyle, CustomizationSelection, FragranceType, Intensity, LabelFont,
        Packaging,
    };

    fn sample_create() -> CustomizationCreate {
        CustomizationCreate {
            name: "Evening Blend".into(),
            selection: CustomizationSelection {
                fragrance: FragranceSelection {
                    fragrance_type: FragranceType::Floral,
                    intensity: Intensity::Medium,
                    specific_notes: vec!["rose".into(), "jasmine".into()],
                },
                bottle: BottleSelection {
                    style: BottleStyle::Luxury,
                    color: "amber".into(),
                    size: BottleSize::Ml50,
                    material: BottleMaterial::Glass,
                },
                label: LabelSelection {
                    text: Some("For Ayesha".into()),
                    font: LabelFont::Script,
                    color: None,
                },
                packaging: Packaging::Gift,
            },
            quantity: 2,
        }
    }

    fn sample_breakdown() -> PriceBreakdown {
        PriceBreakdown {
            base_price: 75.0,
            bottle_upgrade: 45.0,
            fragrance_upgrade: 7.5,
            material_upgrade: 0.0,
            packaging_upgrade: 25.0,
            label_customization: 5.0,
        }
    }

    #[tokio::test]
    async fn test_create_and_read_roundtrip() {
        let pool = test_pool().await;
        let created = create(
            &pool,
            11,
            &sample_create(),
            &sample_breakdown(),
            315.0,
            CustomizationStatus::Completed,
        )
        .await
        .unwrap();

        let found = find_by_id(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(found.user_id, 11);
        assert_eq!(found.fragrance.fragrance_type, FragranceType::Floral);
        assert_eq!(found.fragrance.specific_notes.len(), 2);
        assert_eq!(found.bottle.size, BottleSize::Ml50);
        assert_eq!(found.label.text.as_deref(), Some("For Ayesha"));
        assert_eq!(found.price_breakdown, sample_breakdown());
        assert_eq!(found.total_price, 315.0);
        assert_eq!(found.status, CustomizationStatus::Completed);
        assert_eq!(found.unit_price(), 157.5);
    }

    #[tokio::test]
    async fn test_find_by_user_scopes_and_orders() {
        let pool = test_pool().await;
        create(
            &pool,
            1,
            &sample_create(),
            &sample_breakdown(),
            315.0,
            CustomizationStatus::Draft,
        )
        .await
        .unwrap();
        create(
            &pool,
            2,
            &sample_create(),
            &sample_breakdown(),
            315.0,
            CustomizationStatus::Draft,
        )
        .await
        .unwrap();

        let mine = find_by_user(&pool, 1).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_id, 1);
    }

    #[tokio::test]
    async fn test_mark_ordered() {
        let pool = test_pool().await;
        let created = create(
            &pool,
            1,
            &sample_create(),
            &sample_breakdown(),
            315.0,
            CustomizationStatus::Completed,
        )
        .await
        .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        mark_ordered(&mut conn, created.id).await.unwrap();
        drop(conn);

        let found = find_by_id(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(found.status, CustomizationStatus::Ordered);
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = test_pool().await;
        let created = create(
            &pool,
            1,
            &sample_create(),
            &sample_breakdown(),
            315.0,
            CustomizationStatus::Draft,
        )
        .await
        .unwrap();

        assert!(delete(&pool, created.id).await.unwrap());
        assert!(!delete(&pool, created.id).await.unwrap());
        assert!(find_by_id(&pool, created.id).await.unwrap().is_none());
    }
}
