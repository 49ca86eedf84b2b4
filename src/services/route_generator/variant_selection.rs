use crate::config::RouteGeneratorConfig;
use crate::models::{Place, RouteType};

/// One variant's way of picking places from the shared candidate pool.
pub trait SelectionPolicy: Send + Sync {
    fn route_type(&self) -> RouteType;

    /// Most places this variant ever holds, before the request's count applies.
    fn max_places(&self) -> usize;

    /// Eligible candidates in preference order. Required places are handled
    /// by [`select_places`] and never reach this method.
    fn rank<'a>(&self, candidates: Vec<&'a Place>) -> Vec<&'a Place>;
}

/// Cheapest places under the cost ceiling.
pub struct EconomicPolicy {
    cost_threshold: f64,
    max_places: usize,
}

impl EconomicPolicy {
    pub fn new(config: &RouteGeneratorConfig) -> Self {
        Self {
            cost_threshold: config.economic_cost_threshold,
            max_places: config.economic_max_places,
        }
    }
}

impl SelectionPolicy for EconomicPolicy {
    fn route_type(&self) -> RouteType {
        RouteType::Economic
    }

    fn max_places(&self) -> usize {
        self.max_places
    }

    fn rank<'a>(&self, candidates: Vec<&'a Place>) -> Vec<&'a Place> {
        let mut affordable: Vec<&Place> = candidates
            .into_iter()
            .filter(|p| p.cost_or_zero() <= self.cost_threshold)
            .collect();
        // stable: equal costs keep catalog order
        affordable.sort_by(|a, b| a.cost_or_zero().total_cmp(&b.cost_or_zero()));
        affordable
    }
}

/// Catalog order, no cost filtering.
pub struct BalancedPolicy {
    max_places: usize,
}

impl BalancedPolicy {
    pub fn new(config: &RouteGeneratorConfig) -> Self {
        Self {
            max_places: config.balanced_max_places,
        }
    }
}

impl SelectionPolicy for BalancedPolicy {
    fn route_type(&self) -> RouteType {
        RouteType::Balanced
    }

    fn max_places(&self) -> usize {
        self.max_places
    }

    fn rank<'a>(&self, candidates: Vec<&'a Place>) -> Vec<&'a Place> {
        candidates
    }
}

/// Shortest queues first; places without a wait estimate count as no wait.
pub struct ComfortPolicy {
    max_places: usize,
}

impl ComfortPolicy {
    pub fn new(config: &RouteGeneratorConfig) -> Self {
        Self {
            max_places: config.comfort_max_places,
        }
    }
}

impl SelectionPolicy for ComfortPolicy {
    fn route_type(&self) -> RouteType {
        RouteType::Comfort
    }

    fn max_places(&self) -> usize {
        self.max_places
    }

    fn rank<'a>(&self, mut candidates: Vec<&'a Place>) -> Vec<&'a Place> {
        candidates.sort_by_key(|p| p.estimated_wait_minutes.unwrap_or(0));
        candidates
    }
}

/// The three variant policies in emission order.
pub fn default_policies(config: &RouteGeneratorConfig) -> Vec<Box<dyn SelectionPolicy>> {
    vec![
        Box::new(EconomicPolicy::new(config)),
        Box::new(BalancedPolicy::new(config)),
        Box::new(ComfortPolicy::new(config)),
    ]
}

/// Pick a variant's places: required places first, then the policy's fill.
///
/// The variant holds `min(place_count, policy.max_places())` places, except
/// that required places are never dropped to respect the cap.
pub fn select_places<'a>(
    policy: &dyn SelectionPolicy,
    pool: &'a [Place],
    required: &[&'a Place],
    place_count: usize,
) -> Vec<&'a Place> {
    let cap = place_count.min(policy.max_places());

    let candidates: Vec<&Place> = pool
        .iter()
        .filter(|p| !required.iter().any(|r| r.id == p.id))
        .collect();

    let fill = policy
        .rank(candidates)
        .into_iter()
        .take(cap.saturating_sub(required.len()));

    let selected: Vec<&Place> = required.iter().copied().chain(fill).collect();

    tracing::debug!(
        route_type = %policy.route_type(),
        required = required.len(),
        selected = selected.len(),
        cap = cap,
        "Selected {} places for {} variant",
        selected.len(),
        policy.route_type()
    );

    selected
}
