//! Customization API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::customization as customization_repo;
use crate::pricing::{PricingConfig, Quote};
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{
    Customization, CustomizationCreate, CustomizationSelection, CustomizationStatus,
    CustomizationUpdate,
};
use sqlx::SqlitePool;

/// Create a customization, priced server-side
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CustomizationCreate>,
) -> AppResult<ApiResponse<Customization>> {
    let quote = state.pricing.quote(&payload.selection, payload.quantity)?;
    let customization = customization_repo::create(
        &state.db,
        user.id,
        &payload,
        &quote.price_breakdown,
        quote.total_price,
        CustomizationStatus::Completed,
    )
    .await?;
    Ok(ApiResponse::success(customization))
}

/// List the caller's customizations, newest first
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<Customization>>> {
    let customizations = customization_repo::find_by_user(&state.db, user.id).await?;
    Ok(ApiResponse::success(customizations))
}

/// Get a customization (owner or admin)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Customization>> {
    let customization = load(&state.db, id).await?;
    user.require_owner(customization.user_id, "access this customization")?;
    Ok(ApiResponse::success(customization))
}

/// Update a customization; selection or quantity changes reprice it
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CustomizationUpdate>,
) -> AppResult<ApiResponse<Customization>> {
    let existing = load(&state.db, id).await?;
    user.require_owner(existing.user_id, "update this customization")?;

    let merged = apply_update(existing, payload, &state.pricing)?;
    customization_repo::update(&state.db, &merged).await?;
    let customization = load(&state.db, id).await?;
    Ok(ApiResponse::success(customization))
}

/// Delete a customization (owner or admin)
pub async fn remove(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    let customization = load(&state.db, id).await?;
    user.require_owner(customization.user_id, "delete this customization")?;
    customization_repo::delete(&state.db, id).await?;
    Ok(ApiResponse::ok())
}

/// Price-quote payload
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(flatten)]
    pub selection: CustomizationSelection,
    pub quantity: i64,
}

/// Price a selection without persisting anything (public)
pub async fn calculate_price(
    State(state): State<ServerState>,
    Json(payload): Json<QuoteRequest>,
) -> AppResult<ApiResponse<Quote>> {
    let quote = state.pricing.quote(&payload.selection, payload.quantity)?;
    Ok(ApiResponse::success(quote))
}

async fn load(pool: &SqlitePool, id: i64) -> AppResult<Customization> {
    customization_repo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::CustomizationNotFound,
                format!("Customization {id} not found"),
            )
        })
}

/// Merge an update into an existing customization, repricing when the
/// selection or quantity changed. Status is monotonic: once `ordered` it
/// cannot move back.
fn apply_update(
    mut current: Customization,
    update: CustomizationUpdate,
    pricing: &PricingConfig,
) -> AppResult<Customization> {
    if let Some(status) = update.status {
        if current.status == CustomizationStatus::Ordered && status != CustomizationStatus::Ordered
        {
            return Err(AppError::invalid(
                "An ordered customization cannot change status",
            ));
        }
        current.status = status;
    }

    let mut reprice = update.quantity.is_some();
    if let Some(name) = update.name {
        current.name = name;
    }
    if let Some(fragrance) = update.fragrance {
        current.fragrance = fragrance;
        reprice = true;
    }
    if let Some(bottle) = update.bottle {
        current.bottle = bottle;
        reprice = true;
    }
    if let Some(label) = update.label {
        current.label = label;
        reprice = true;
    }
    if let Some(packaging) = update.packaging {
        current.packaging = packaging;
        reprice = true;
    }
    if let Some(quantity) = update.quantity {
        current.quantity = quantity;
    }
    if let Some(image) = update.image {
        current.image = Some(image);
    }

    if reprice {
        let selection = CustomizationSelection {
            fragrance: current.fragrance.clone(),
            bottle: current.bottle.clone(),
            label: current.label.clone(),
            packaging: current.packaging,
        };
        let quote = pricing.quote(&selection, current.quantity)?;
        current.price_breakdown = quote.price_breakdown;
        current.total_price = quote.total_price;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{
        BottleMaterial, BottleSelection, BottleSize, BottleStyle, FragranceSelection,
        FragranceType, Intensity, LabelFont, LabelSelection, Packaging, PriceBreakdown,
    };

    fn existing(status: CustomizationStatus) -> Customization {
        Customization {
            id: 1,
            user_id: 1,
            name: "Evening Blend".into(),
            fragrance: FragranceSelection {
                fragrance_type: FragranceType::Floral,
                intensity: Intensity::Medium,
                specific_notes: Vec::new(),
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
            quantity: 2,
            price_breakdown: PriceBreakdown {
                base_price: 75.0,
                bottle_upgrade: 45.0,
                fragrance_upgrade: 7.5,
                material_upgrade: 0.0,
                packaging_upgrade: 25.0,
                label_customization: 5.0,
            },
            total_price: 315.0,
            status,
            image: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_name_change_keeps_price() {
        let update = CustomizationUpdate {
            name: Some("Morning Blend".into()),
            ..Default::default()
        };
        let merged = apply_update(
            existing(CustomizationStatus::Completed),
            update,
            &PricingConfig::default(),
        )
        .unwrap();
        assert_eq!(merged.name, "Morning Blend");
        assert_eq!(merged.total_price, 315.0);
    }

    #[test]
    fn test_quantity_change_reprices() {
        let update = CustomizationUpdate {
            quantity: Some(4),
            ..Default::default()
        };
        let merged = apply_update(
            existing(CustomizationStatus::Completed),
            update,
            &PricingConfig::default(),
        )
        .unwrap();
        assert_eq!(merged.total_price, 630.0);
    }

    #[test]
    fn test_packaging_change_reprices() {
        let update = CustomizationUpdate {
            packaging: Some(Packaging::Standard),
            ..Default::default()
        };
        let merged = apply_update(
            existing(CustomizationStatus::Completed),
            update,
            &PricingConfig::default(),
        )
        .unwrap();
        assert_eq!(merged.price_breakdown.packaging_upgrade, 0.0);
        // unit 132.5 × 2
        assert_eq!(merged.total_price, 265.0);
    }

    #[test]
    fn test_ordered_status_is_sticky() {
        let update = CustomizationUpdate {
            status: Some(CustomizationStatus::Draft),
            ..Default::default()
        };
        let err = apply_update(
            existing(CustomizationStatus::Ordered),
            update,
            &PricingConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[test]
    fn test_forward_status_allowed() {
        let update = CustomizationUpdate {
            status: Some(CustomizationStatus::Completed),
            ..Default::default()
        };
        let merged = apply_update(
            existing(CustomizationStatus::Draft),
            update,
            &PricingConfig::default(),
        )
        .unwrap();
        assert_eq!(merged.status, CustomizationStatus::Completed);
    }

    #[test]
    fn test_out_of_range_quantity_rejected() {
        let update = CustomizationUpdate {
            quantity: Some(11),
            ..Default::default()
        };
        let err = apply_update(
            existing(CustomizationStatus::Completed),
            update,
            &PricingConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
