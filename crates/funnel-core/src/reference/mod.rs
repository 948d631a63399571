//! Reference-data loading with a static fallback.

pub mod tables;

use crate::backend::{ReferenceCategory, ReferenceDataService, ReferenceRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Province and city lists shown on the location step.
///
/// Only the cities of the currently selected province are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocationCatalog {
    pub provinces: Vec<ReferenceRecord>,
    pub cities_by_province: BTreeMap<String, Vec<ReferenceRecord>>,
}

impl LocationCatalog {
    pub fn cities(&self, province_id: &str) -> Option<&[ReferenceRecord]> {
        self.cities_by_province
            .get(province_id)
            .map(|c| c.as_slice())
    }

    /// Drop every city list; used when the selected province changes.
    pub fn clear_cities(&mut self) {
        self.cities_by_province.clear();
    }

    /// Replace the city lists with the one for `province_id`.
    pub fn set_cities(&mut self, province_id: &str, cities: Vec<ReferenceRecord>) {
        self.cities_by_province.clear();
        self.cities_by_province
            .insert(province_id.to_string(), cities);
    }
}

/// Wraps the reference-data service so callers always get a usable list.
#[derive(Clone)]
pub struct ReferenceDataLoader {
    service: Arc<dyn ReferenceDataService>,
}

impl ReferenceDataLoader {
    pub fn new(service: Arc<dyn ReferenceDataService>) -> Self {
        Self { service }
    }

    /// Load records for a category. Never fails and never returns an empty
    /// list.
    #[instrument(skip(self))]
    pub async fn load(
        &self,
        category: ReferenceCategory,
        parent_key: Option<&str>,
    ) -> Vec<ReferenceRecord> {
        match self.service.get_reference_data(category, parent_key).await {
            Ok(records) if !records.is_empty() => {
                debug!(count = records.len(), "Loaded live reference data");
                records
            }
            Ok(_) => {
                warn!("Reference service returned no records, using static table");
                fallback(category, parent_key)
            }
            Err(e) => {
                warn!(error = %e, "Reference service failed, using static table");
                fallback(category, parent_key)
            }
        }
    }

    pub async fn provinces(&self) -> Vec<ReferenceRecord> {
        self.load(ReferenceCategory::Province, None).await
    }

    pub async fn cities(&self, province_id: &str) -> Vec<ReferenceRecord> {
        self.load(ReferenceCategory::City, Some(province_id)).await
    }
}

/// Static table for a category/parent, or the synthetic "Other" entry.
pub fn fallback(category: ReferenceCategory, parent_key: Option<&str>) -> Vec<ReferenceRecord> {
    let records = match category {
        ReferenceCategory::Province => Some(tables::provinces()),
        ReferenceCategory::City => parent_key.and_then(tables::cities),
    };

    match records {
        Some(records) if !records.is_empty() => records,
        _ => tables::other(),
    }
}
