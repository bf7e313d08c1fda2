use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entities::part::{self, Entity as Part};
use crate::errors::ServiceError;

/// Resolves the effective unit price of a catalog part. Newer catalog rows
/// carry a structured `pricing` blob whose `retailPrice` wins; older rows only
/// have the flat `unit_price`. A part with neither is priced at zero. Every
/// price snapshot in the system goes through this single normalization.
pub fn normalized_unit_price(part: &part::Model) -> Decimal {
    if let Some(pricing) = &part.pricing {
        if let Some(value) = pricing.get("retailPrice") {
            if let Some(price) = json_number_to_decimal(value) {
                return price;
            }
        }
    }
    part.unit_price.unwrap_or(Decimal::ZERO)
}

fn json_number_to_decimal(value: &serde_json::Value) -> Option<Decimal> {
    if let Some(i) = value.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(f) = value.as_f64() {
        return Decimal::from_f64_retain(f);
    }
    value.as_str().and_then(|s| s.parse::<Decimal>().ok())
}

/// Loads the catalog rows for a set of part ids, failing if any id is
/// unknown. Accepts duplicates; callers pass line part ids as-is.
pub async fn load_parts<C: ConnectionTrait>(
    conn: &C,
    part_ids: &[String],
) -> Result<HashMap<String, part::Model>, ServiceError> {
    let distinct: BTreeSet<String> = part_ids.iter().cloned().collect();
    let rows = Part::find()
        .filter(part::Column::Id.is_in(distinct.iter().cloned()))
        .all(conn)
        .await?;
    let map: HashMap<String, part::Model> =
        rows.into_iter().map(|p| (p.id.clone(), p)).collect();

    let missing: Vec<String> = distinct
        .into_iter()
        .filter(|id| !map.contains_key(id))
        .collect();
    if !missing.is_empty() {
        return Err(ServiceError::NotFound(format!(
            "Unknown part(s): {}",
            missing.join(", ")
        )));
    }
    Ok(map)
}

/// Catalog part as exposed over the API, with the price already normalized.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartView {
    pub id: String,
    pub name: String,
    pub part_number: String,
    pub unit_price: Decimal,
    pub warranty_months: Option<i32>,
}

impl From<part::Model> for PartView {
    fn from(model: part::Model) -> Self {
        let unit_price = normalized_unit_price(&model);
        Self {
            id: model.id,
            name: model.name,
            part_number: model.part_number,
            unit_price,
            warranty_months: model.warranty_months,
        }
    }
}

/// Read-side access to the parts catalog.
pub struct PartCatalogService {
    db: Arc<DbPool>,
}

impl PartCatalogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_part(&self, part_id: &str) -> Result<PartView, ServiceError> {
        let part = Part::find_by_id(part_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Part {} not found", part_id)))?;
        Ok(part.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn part_with(unit_price: Option<Decimal>, pricing: Option<serde_json::Value>) -> part::Model {
        part::Model {
            id: "P100".into(),
            name: "Door gasket".into(),
            part_number: "DG-41".into(),
            unit_price,
            pricing,
            warranty_months: Some(12),
        }
    }

    #[test]
    fn retail_price_wins_over_flat_price() {
        let part = part_with(Some(dec!(10)), Some(json!({ "retailPrice": 12.5 })));
        assert_eq!(normalized_unit_price(&part), dec!(12.5));
    }

    #[test]
    fn falls_back_to_flat_price() {
        let part = part_with(Some(dec!(10)), None);
        assert_eq!(normalized_unit_price(&part), dec!(10));

        let part = part_with(Some(dec!(10)), Some(json!({ "wholesale": 8 })));
        assert_eq!(normalized_unit_price(&part), dec!(10));
    }

    #[test]
    fn unpriced_part_is_zero() {
        let part = part_with(None, None);
        assert_eq!(normalized_unit_price(&part), Decimal::ZERO);
    }

    #[test]
    fn retail_price_accepts_integers_and_strings() {
        let part = part_with(None, Some(json!({ "retailPrice": 30 })));
        assert_eq!(normalized_unit_price(&part), dec!(30));

        let part = part_with(None, Some(json!({ "retailPrice": "19.99" })));
        assert_eq!(normalized_unit_price(&part), dec!(19.99));
    }
}
