//! Personal (saved) filters stored on the user's profile.
//!
//! The whole list lives in one profile attribute as an array of JSON
//! strings, and is always read and written wholesale.

use crate::error::{QueueError, Result};
use crate::remote::{Profile, SubmissionApi};
use crate::types::FilterType;

use super::Filter;

/// Profile attribute holding the serialized personal filters
pub const PERSONAL_FILTERS_ATTRIBUTE: &str = "Queue Personal Filters";

/// Decode the attribute values, skipping entries that are not valid filters
pub fn decode_personal_filters(values: &[String]) -> Vec<Filter> {
    values
        .iter()
        .filter_map(|raw| match serde_json::from_str::<Filter>(raw) {
            Ok(filter) => Some(filter.with_type(FilterType::Custom)),
            Err(e) => {
                tracing::warn!("Skipping unreadable personal filter: {e}");
                None
            }
        })
        .collect()
}

pub fn encode_personal_filters(filters: &[Filter]) -> Result<Vec<String>> {
    filters
        .iter()
        .map(|f| serde_json::to_string(f).map_err(QueueError::from))
        .collect()
}

/// Personal filters recorded on a loaded profile
pub fn personal_filters_from_profile(profile: &Profile) -> Vec<Filter> {
    profile
        .attribute_values(PERSONAL_FILTERS_ATTRIBUTE)
        .map(decode_personal_filters)
        .unwrap_or_default()
}

fn position(filters: &[Filter], name: &str) -> Option<usize> {
    filters.iter().position(|f| f.name.eq_ignore_ascii_case(name))
}

/// Append a filter; names are unique case-insensitively
pub fn add_personal_filter(filters: &[Filter], filter: Filter) -> Result<Vec<Filter>> {
    if position(filters, &filter.name).is_some() {
        return Err(QueueError::DuplicateFilter(filter.name));
    }
    let mut next = filters.to_vec();
    next.push(filter.with_type(FilterType::Custom));
    Ok(next)
}

/// Replace the filter called `original_name`, keeping its position
pub fn update_personal_filter(
    filters: &[Filter],
    original_name: &str,
    filter: Filter,
) -> Result<Vec<Filter>> {
    let index = position(filters, original_name)
        .ok_or_else(|| QueueError::FilterNotFound(original_name.to_string()))?;
    if let Some(other) = position(filters, &filter.name)
        && other != index
    {
        return Err(QueueError::DuplicateFilter(filter.name));
    }
    let mut next = filters.to_vec();
    next[index] = filter.with_type(FilterType::Custom);
    Ok(next)
}

pub fn remove_personal_filter(filters: &[Filter], name: &str) -> Result<Vec<Filter>> {
    let index =
        position(filters, name).ok_or_else(|| QueueError::FilterNotFound(name.to_string()))?;
    let mut next = filters.to_vec();
    next.remove(index);
    Ok(next)
}

/// Load the current user's personal filters from the backend
pub async fn load_personal_filters<A: SubmissionApi>(api: &A) -> Result<Vec<Filter>> {
    let profile = api.fetch_profile().await?;
    Ok(personal_filters_from_profile(&profile))
}

/// Write the full personal filter list back to the profile
pub async fn store_personal_filters<A: SubmissionApi>(api: &A, filters: &[Filter]) -> Result<()> {
    let values = encode_personal_filters(filters)?;
    tracing::debug!("Writing {} personal filter(s)", values.len());
    api.update_profile_attribute(PERSONAL_FILTERS_ATTRIBUTE, values)
        .await
}
