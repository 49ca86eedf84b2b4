mod assembly;
mod candidates;
mod sequencing;
pub mod variant_selection;

use crate::config::RouteGeneratorConfig;
use crate::error::{AppError, Result};
use crate::models::{GenerationRequest, Place, Route};
use crate::services::catalog::PlaceCatalog;
use crate::services::cost_model::CostModel;
use crate::services::distance::DistanceEstimator;
use crate::services::weather::WeatherAdvisor;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use assembly::RouteAssembler;
use variant_selection::{default_policies, select_places, SelectionPolicy};

/// Where a generation call currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Collecting,
    Filtering,
    Assembling,
    Done,
}

/// Caller-side handle on one generation call: cancellation plus optional
/// progress reporting.
#[derive(Default)]
pub struct GenerationControl {
    cancel: CancellationToken,
    progress: Option<watch::Sender<GenerationStage>>,
}

impl GenerationControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            progress: None,
        }
    }

    /// Subscribe to stage changes. The receiver starts at `Collecting`.
    pub fn with_progress(mut self) -> (Self, watch::Receiver<GenerationStage>) {
        let (tx, rx) = watch::channel(GenerationStage::Collecting);
        self.progress = Some(tx);
        (self, rx)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn report(&self, stage: GenerationStage) {
        if let Some(progress) = &self.progress {
            // no receivers left is fine
            let _ = progress.send(stage);
        }
    }
}

/// Builds the ECONOMIC, BALANCED and COMFORT itineraries for a request.
///
/// Stateless between calls; the collaborators are shared and read-only, so
/// one generator serves concurrent requests.
pub struct RouteGenerator {
    catalog: Arc<dyn PlaceCatalog>,
    advisor: Arc<dyn WeatherAdvisor>,
    config: RouteGeneratorConfig,
    policies: Vec<Box<dyn SelectionPolicy>>,
    assembler: RouteAssembler,
    distance: DistanceEstimator,
}

impl RouteGenerator {
    pub fn new(
        catalog: Arc<dyn PlaceCatalog>,
        advisor: Arc<dyn WeatherAdvisor>,
        config: RouteGeneratorConfig,
    ) -> Self {
        let policies = default_policies(&config);
        let distance = DistanceEstimator::new();
        let assembler = RouteAssembler::new(
            CostModel::new(config.cost_policy.clone()),
            distance,
            config.default_stop_duration_minutes,
        );

        tracing::info!(
            catalog = catalog.backend_name(),
            weather = advisor.backend_name(),
            sequencing = ?config.sequencing,
            "Route generator ready"
        );

        RouteGenerator {
            catalog,
            advisor,
            config,
            policies,
            assembler,
            distance,
        }
    }

    pub fn config(&self) -> &RouteGeneratorConfig {
        &self.config
    }

    pub fn catalog_backend(&self) -> &'static str {
        self.catalog.backend_name()
    }

    pub fn weather_backend(&self) -> &'static str {
        self.advisor.backend_name()
    }

    /// Generate the three variants. See [`RouteGenerator::generate_with`].
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Route>> {
        self.generate_with(request, &GenerationControl::new()).await
    }

    /// Fresh generation for adjusted preferences; earlier picks are not kept.
    pub async fn regenerate(&self, request: &GenerationRequest) -> Result<Vec<Route>> {
        self.generate(request).await
    }

    /// Generate the three variants, honouring cancellation.
    ///
    /// Returns exactly three routes (ECONOMIC, BALANCED, COMFORT) or none
    /// when the filtered pool is empty. A malformed request is rejected
    /// before any collaborator is called. Cancelling drops in-flight catalog
    /// and weather calls and yields [`AppError::Cancelled`].
    pub async fn generate_with(
        &self,
        request: &GenerationRequest,
        control: &GenerationControl,
    ) -> Result<Vec<Route>> {
        request.validate().map_err(AppError::InvalidRequest)?;

        let cancel = control.cancellation_token();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Route generation cancelled by caller");
                Err(AppError::Cancelled)
            }
            result = self.run(request, control) => result,
        }
    }

    async fn run(&self, request: &GenerationRequest, control: &GenerationControl) -> Result<Vec<Route>> {
        let start_time = Instant::now();
        let categories = request.distinct_categories();

        tracing::info!(
            lat = request.origin.lat,
            lng = request.origin.lng,
            categories = ?categories,
            place_count = request.place_count,
            mode = %request.mode,
            "Generating routes for {} categories, {} places",
            categories.len(),
            request.place_count
        );

        control.report(GenerationStage::Collecting);
        let pool =
            candidates::collect_candidates(self.catalog.as_ref(), &categories, &request.origin)
                .await?;
        let collected = pool.len();

        control.report(GenerationStage::Filtering);
        let pool =
            candidates::filter_by_weather(self.advisor.as_ref(), pool, &request.sensitivity).await;

        tracing::info!(
            collected = collected,
            candidates = pool.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Candidate pool: {} collected, {} after weather filtering",
            collected,
            pool.len()
        );

        if pool.is_empty() {
            control.report(GenerationStage::Done);
            tracing::info!("No candidates for the requested categories, returning no routes");
            return Ok(Vec::new());
        }

        control.report(GenerationStage::Assembling);
        let routes = self.assemble_variants(request, &pool);

        control.report(GenerationStage::Done);
        tracing::info!(
            routes = routes.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Generated {} routes in {:?}",
            routes.len(),
            start_time.elapsed()
        );

        Ok(routes)
    }

    fn assemble_variants(&self, request: &GenerationRequest, pool: &[Place]) -> Vec<Route> {
        let required_ids = request.distinct_required_ids();
        let required: Vec<&Place> = required_ids
            .iter()
            .filter_map(|id| {
                let found = pool.iter().find(|p| p.id == *id);
                if found.is_none() {
                    tracing::warn!(place_id = %id, "Required place not among candidates, ignoring");
                }
                found
            })
            .collect();
        let required_set: HashSet<&str> = required.iter().map(|p| p.id.as_str()).collect();

        self.policies
            .iter()
            .map(|policy| {
                let selected =
                    select_places(policy.as_ref(), pool, &required, request.place_count as usize);
                let ordered = sequencing::sequence(
                    self.config.sequencing,
                    &self.distance,
                    &request.origin,
                    selected,
                );

                let mut route = self.assembler.assemble(
                    policy.route_type(),
                    request.mode,
                    &request.origin,
                    &ordered,
                    &required_set,
                    request.city.clone(),
                );

                if let Some(max_budget) = request.max_budget {
                    let ceiling = max_budget * self.config.budget_tolerance;
                    if route.total_budget > ceiling {
                        route.exceeds_budget = true;
                        tracing::info!(
                            route_type = %route.route_type,
                            total_budget = route.total_budget,
                            max_budget = max_budget,
                            "{} route exceeds budget: {:.2} > {:.2}",
                            route.route_type,
                            route.total_budget,
                            ceiling
                        );
                    }
                }

                route
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, PlaceCategory, RouteType, TransportMode};
    use crate::services::catalog::{CatalogError, InMemoryCatalog};
    use crate::services::weather::NoopWeatherAdvisor;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn paris() -> Coordinates {
        Coordinates::new(48.8566, 2.3522).unwrap()
    }

    fn culture(id: &str, cost: f64, offset: f64) -> Place {
        Place::new(
            id,
            id,
            PlaceCategory::Culture,
            Coordinates::new(48.8566 + offset, 2.3522).unwrap(),
        )
        .with_average_cost(cost)
    }

    fn generator(places: Vec<Place>) -> RouteGenerator {
        RouteGenerator::new(
            Arc::new(InMemoryCatalog::new(places)),
            Arc::new(NoopWeatherAdvisor),
            RouteGeneratorConfig::default(),
        )
    }

    struct SlowCatalog {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PlaceCatalog for SlowCatalog {
        async fn query_by_category(
            &self,
            _category: PlaceCategory,
            _origin: Option<&Coordinates>,
        ) -> std::result::Result<Vec<Place>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![])
        }

        fn backend_name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn emits_three_variants_in_order() {
        let gen = generator(vec![culture("a", 5.0, 0.001), culture("b", 15.0, 0.002)]);
        let request = GenerationRequest::new(paris(), vec![PlaceCategory::Culture], 3);

        let routes = gen.generate(&request).await.unwrap();
        let types: Vec<RouteType> = routes.iter().map(|r| r.route_type).collect();
        assert_eq!(types, vec![RouteType::Economic, RouteType::Balanced, RouteType::Comfort]);
        assert!(routes.iter().all(|r| !r.is_favorite && !r.is_saved));
        assert_eq!(routes[0].stops.len(), 1);
        assert_eq!(routes[1].stops.len(), 2);
    }

    #[tokio::test]
    async fn empty_pool_returns_no_routes() {
        let gen = generator(vec![]);
        let request = GenerationRequest::new(paris(), vec![PlaceCategory::Restaurant], 3);
        assert!(gen.generate(&request).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn budget_overrun_is_flagged_not_dropped() {
        let gen = generator(vec![culture("a", 40.0, 0.001), culture("b", 45.0, 0.002)]);
        let mut request = GenerationRequest::new(paris(), vec![PlaceCategory::Culture], 2);
        request.mode = TransportMode::Walking;
        request.max_budget = Some(50.0);

        let routes = gen.generate(&request).await.unwrap();
        assert_eq!(routes.len(), 3);
        // economic has nothing under the threshold, so it is empty and cheap
        assert!(!routes[0].exceeds_budget);
        assert!(routes[1].exceeds_budget);
    }

    #[tokio::test]
    async fn malformed_request_never_reaches_the_catalog() {
        let catalog = Arc::new(SlowCatalog {
            calls: AtomicUsize::new(0),
        });
        let gen = RouteGenerator::new(
            catalog.clone(),
            Arc::new(NoopWeatherAdvisor),
            RouteGeneratorConfig::default(),
        );

        let request = GenerationRequest::new(paris(), vec![], 3);
        assert!(matches!(gen.generate(&request).await, Err(AppError::InvalidRequest(_))));
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_slow_catalog() {
        let gen = RouteGenerator::new(
            Arc::new(SlowCatalog {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(NoopWeatherAdvisor),
            RouteGeneratorConfig::default(),
        );
        let request = GenerationRequest::new(paris(), vec![PlaceCategory::Culture], 3);

        let control = GenerationControl::new();
        let token = control.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let result = gen.generate_with(&request, &control).await;
        assert!(matches!(result, Err(AppError::Cancelled)));
    }

    #[tokio::test]
    async fn progress_reaches_done() {
        let gen = generator(vec![culture("a", 5.0, 0.001)]);
        let request = GenerationRequest::new(paris(), vec![PlaceCategory::Culture], 1);

        let (control, progress) = GenerationControl::new().with_progress();
        gen.generate_with(&request, &control).await.unwrap();
        assert_eq!(*progress.borrow(), GenerationStage::Done);
    }
}
