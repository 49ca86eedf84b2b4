use crate::error::{AppError, Result};
use crate::models::{Coordinates, Place, PlaceCategory, SensitivityProfile};
use crate::services::catalog::PlaceCatalog;
use crate::services::weather::WeatherAdvisor;
use futures::future::join_all;
use std::collections::HashSet;

/// Query every category concurrently and merge the answers.
///
/// Pool order is categories in request order, each in catalog order, with
/// later duplicates of an id dropped. A failing category contributes nothing;
/// only when every category fails is the catalog reported unreachable.
pub(super) async fn collect_candidates(
    catalog: &dyn PlaceCatalog,
    categories: &[PlaceCategory],
    origin: &Coordinates,
) -> Result<Vec<Place>> {
    let queries = categories
        .iter()
        .map(|&category| async move { (category, catalog.query_by_category(category, Some(origin)).await) });
    let answers = join_all(queries).await;

    let mut failures = Vec::new();
    let mut seen = HashSet::new();
    let mut pool = Vec::new();

    for (category, answer) in answers {
        match answer {
            Ok(places) => {
                tracing::debug!(
                    category = %category,
                    candidates = places.len(),
                    "Catalog returned {} {} places",
                    places.len(),
                    category
                );
                pool.extend(places.into_iter().filter(|p| seen.insert(p.id.clone())));
            }
            Err(e) => {
                tracing::warn!(
                    category = %category,
                    error = %e,
                    "Catalog query failed for {}, continuing without it",
                    category
                );
                failures.push(format!("{}: {}", category, e));
            }
        }
    }

    if !categories.is_empty() && failures.len() == categories.len() {
        return Err(AppError::Connectivity(failures.join("; ")));
    }

    Ok(pool)
}

/// Drop weather-exposed places the advisor judges unsuitable.
///
/// Weather-neutral places are never checked. An advisor error keeps the
/// place, so an unreachable weather service filters nothing.
pub(super) async fn filter_by_weather(
    advisor: &dyn WeatherAdvisor,
    pool: Vec<Place>,
    sensitivity: &SensitivityProfile,
) -> Vec<Place> {
    let checks = pool.iter().map(|place| async move {
        if place.weather_impact.is_neutral() {
            return None;
        }
        Some(advisor.is_suitable(&place.coordinates, sensitivity).await)
    });
    let verdicts = join_all(checks).await;

    let mut advisory_failures = 0usize;
    let mut excluded = 0usize;

    let kept: Vec<Place> = pool
        .into_iter()
        .zip(verdicts)
        .filter_map(|(place, verdict)| match verdict {
            None | Some(Ok(true)) => Some(place),
            Some(Ok(false)) => {
                tracing::debug!(place_id = %place.id, "Excluding place unsuited to current weather");
                excluded += 1;
                None
            }
            Some(Err(e)) => {
                tracing::debug!(place_id = %place.id, error = %e, "Weather check failed, keeping place");
                advisory_failures += 1;
                Some(place)
            }
        })
        .collect();

    if advisory_failures > 0 {
        tracing::warn!(
            failures = advisory_failures,
            "Weather advice unavailable for {} places, kept them unfiltered",
            advisory_failures
        );
    }
    tracing::debug!(kept = kept.len(), excluded = excluded, "Weather filtering done");

    kept
}
