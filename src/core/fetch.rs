use crate::core::flatten::flatten;
use crate::core::query::{build_query, FilterParameters, Variant, DEFAULT_SINCE_DATE, DEFAULT_UNTIL_DATE};
use crate::core::scroll::{fetch_all, ScrollSettings};
use crate::core::{FlatTable, SearchBackend};
use crate::utils::error::Result;

/// Fetches every application matching `variant`/`params` and flattens them.
///
/// Uses the default scroll settings (`applications` index, 10 000 hits per page,
/// 2 minute lease). No table is produced if any page request fails.
pub async fn fetch_applications<B: SearchBackend + ?Sized>(
    backend: &B,
    variant: Variant,
    params: &FilterParameters,
) -> Result<FlatTable> {
    fetch_applications_with(backend, variant, params, &ScrollSettings::default()).await
}

pub async fn fetch_applications_with<B: SearchBackend + ?Sized>(
    backend: &B,
    variant: Variant,
    params: &FilterParameters,
    settings: &ScrollSettings,
) -> Result<FlatTable> {
    tracing::info!(
        "🚀 Fetching applications: {} >= {}, valid_date in [{}, {})",
        variant,
        params.threshold,
        params.since_date,
        params.until_date
    );

    let query = build_query(variant, params);
    let records = fetch_all(backend, &query, settings).await?;
    Ok(flatten(records))
}

fn params(threshold: u64, since_date: Option<&str>, until_date: Option<&str>) -> FilterParameters {
    FilterParameters::new(threshold)
        .since(since_date.unwrap_or(DEFAULT_SINCE_DATE))
        .until(until_date.unwrap_or(DEFAULT_UNTIL_DATE))
}

/// Applications proposing at least `threshold` residential units.
pub async fn residential_units_query<B: SearchBackend + ?Sized>(
    backend: &B,
    threshold: u64,
    since_date: Option<&str>,
    until_date: Option<&str>,
) -> Result<FlatTable> {
    fetch_applications(
        backend,
        Variant::AllResidentialUnits,
        &params(threshold, since_date, until_date),
    )
    .await
}

/// Applications proposing at least `threshold` social-rent units.
pub async fn social_rent_units_query<B: SearchBackend + ?Sized>(
    backend: &B,
    threshold: u64,
    since_date: Option<&str>,
    until_date: Option<&str>,
) -> Result<FlatTable> {
    fetch_applications(
        backend,
        Variant::SocialRentUnits,
        &params(threshold, since_date, until_date),
    )
    .await
}
