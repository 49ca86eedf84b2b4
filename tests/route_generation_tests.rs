use easytrip::config::RouteGeneratorConfig;
use easytrip::models::{
    GenerationRequest, PlaceCategory, Route, RouteType, SensitivityProfile, TransportMode, WeatherImpact,
};
use easytrip::services::{CostModel, DistanceEstimator, InMemoryCatalog, RouteGenerator};
use easytrip::AppError;
use std::sync::atomic::Ordering;
use std::sync::Arc;

mod common;

use common::{create_test_place, generator_with, paris, BrokenAdvisor, StormAdvisor, UnreachableCatalog};

fn mixed_pool() -> Vec<easytrip::models::Place> {
    vec![
        create_test_place("louvre", PlaceCategory::Culture, 17.0, 0.004),
        create_test_place("orsay", PlaceCategory::Culture, 16.0, 0.008),
        create_test_place("bistrot", PlaceCategory::Restaurant, 22.0, 0.003).with_wait_minutes(20),
        create_test_place("crepes", PlaceCategory::Restaurant, 6.0, 0.006).with_wait_minutes(5),
        create_test_place("jardin", PlaceCategory::Leisure, 0.0, 0.010),
        create_test_place("passage", PlaceCategory::Discovery, 4.0, 0.012).with_wait_minutes(0),
    ]
}

fn all_categories_request(mode: TransportMode, place_count: u32) -> GenerationRequest {
    let mut request = GenerationRequest::new(paris(), PlaceCategory::ALL.to_vec(), place_count);
    request.mode = mode;
    request
}

fn assert_totals_consistent(route: &Route) {
    let stop_costs: f64 = route.stops.iter().map(|s| s.cost).sum();
    let transport: f64 = route.stops.iter().map(|s| s.transport_cost).sum();
    assert!(
        (route.total_budget - (stop_costs + transport)).abs() < 1e-6,
        "{} route total {} != {} + {}",
        route.route_type,
        route.total_budget,
        stop_costs,
        transport
    );

    let durations: u32 = route.stops.iter().map(|s| s.estimated_duration_minutes).sum();
    assert_eq!(route.total_duration_minutes, durations);
}

#[tokio::test]
async fn test_stop_order_is_contiguous() {
    let generator = generator_with(mixed_pool());

    for place_count in 1..=6 {
        let routes = generator
            .generate(&all_categories_request(TransportMode::Walking, place_count))
            .await
            .unwrap();
        assert_eq!(routes.len(), 3);

        for route in &routes {
            let orders: Vec<u32> = route.stops.iter().map(|s| s.order).collect();
            let expected: Vec<u32> = (1..=route.stops.len() as u32).collect();
            assert_eq!(orders, expected, "{} route with {} places", route.route_type, place_count);
        }
    }
}

#[tokio::test]
async fn test_total_budget_matches_stop_and_segment_costs() {
    let generator = generator_with(mixed_pool());
    let cost_model = CostModel::default();

    for mode in [TransportMode::Car, TransportMode::PublicTransport, TransportMode::Bicycle] {
        let routes = generator.generate(&all_categories_request(mode, 4)).await.unwrap();

        for route in &routes {
            assert_totals_consistent(route);

            let expected: f64 = route.stops.iter().map(|s| s.place.cost_or_zero()).sum::<f64>()
                + route
                    .stops
                    .iter()
                    .map(|s| cost_model.segment_transport_cost(mode, s.distance_from_previous_km))
                    .sum::<f64>();
            assert!((route.total_budget - expected).abs() < 1e-6);
        }
    }
}

#[tokio::test]
async fn test_mixed_mode_total_uses_journey_cost() {
    let generator = generator_with(mixed_pool());
    let cost_model = CostModel::default();

    let routes = generator
        .generate(&all_categories_request(TransportMode::Mixed, 5))
        .await
        .unwrap();

    for route in &routes {
        assert_totals_consistent(route);
        let legs: Vec<f64> = route.stops.iter().map(|s| s.distance_from_previous_km).collect();
        let expected = cost_model.journey_transport_cost(TransportMode::Mixed, &legs);
        assert!((route.transport_cost_total() - expected).abs() < 1e-6);
    }
}

#[test]
fn test_distance_is_symmetric_and_zero_on_self() {
    let estimator = DistanceEstimator::new();
    let a = paris();
    let b = easytrip::models::Coordinates::new(45.7640, 4.8357).unwrap();

    assert_eq!(estimator.distance(&a, &b), estimator.distance(&b, &a));
    assert_eq!(estimator.distance(&a, &a), 0.0);
}

#[tokio::test]
async fn test_economic_route_respects_cost_ceiling() {
    let generator = generator_with(mixed_pool());
    let threshold = RouteGeneratorConfig::default().economic_cost_threshold;

    let routes = generator
        .generate(&all_categories_request(TransportMode::Walking, 6))
        .await
        .unwrap();
    let economic = &routes[0];

    assert_eq!(economic.route_type, RouteType::Economic);
    assert!(!economic.stops.is_empty());
    assert!(economic.stops.iter().all(|s| s.place.cost_or_zero() <= threshold));
}

#[tokio::test]
async fn test_required_place_appears_in_every_variant() {
    let generator = generator_with(mixed_pool());
    let mut request = all_categories_request(TransportMode::Walking, 2);
    request.required_place_ids = vec!["bistrot".to_string()];

    let routes = generator.generate(&request).await.unwrap();

    assert_eq!(routes.len(), 3);
    for route in &routes {
        assert!(
            route.place_ids().contains(&"bistrot"),
            "{} route is missing the required place",
            route.route_type
        );
    }
}

#[tokio::test]
async fn test_unknown_required_place_is_ignored() {
    let generator = generator_with(mixed_pool());
    let mut request = all_categories_request(TransportMode::Walking, 2);
    request.required_place_ids = vec!["does-not-exist".to_string()];

    let routes = generator.generate(&request).await.unwrap();

    assert_eq!(routes.len(), 3);
    assert!(routes.iter().all(|r| r.stops.len() <= 2));
}

#[tokio::test]
async fn test_empty_catalog_yields_no_routes() {
    let generator = generator_with(vec![]);

    let routes = generator
        .generate(&all_categories_request(TransportMode::Walking, 3))
        .await
        .unwrap();

    assert!(routes.is_empty());
}

#[tokio::test]
async fn test_unreachable_catalog_is_a_connectivity_failure() {
    let catalog = Arc::new(UnreachableCatalog::default());
    let generator = RouteGenerator::new(
        catalog.clone(),
        Arc::new(easytrip::services::NoopWeatherAdvisor),
        RouteGeneratorConfig::default(),
    );

    let err = generator
        .generate(&all_categories_request(TransportMode::Walking, 3))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Connectivity(_)), "got {:?}", err);
    assert!(err.is_retryable());
    assert_eq!(catalog.calls.load(Ordering::SeqCst), PlaceCategory::ALL.len());
}

#[tokio::test]
async fn test_weather_failures_keep_every_candidate() {
    let exposed = WeatherImpact {
        cold: 2,
        heat: 1,
        humidity: 1,
    };
    let places: Vec<_> = mixed_pool()
        .into_iter()
        .map(|p| p.with_weather_impact(exposed))
        .collect();
    let advisor = Arc::new(BrokenAdvisor::default());
    let generator = RouteGenerator::new(
        Arc::new(InMemoryCatalog::new(places)),
        advisor.clone(),
        RouteGeneratorConfig::default(),
    );

    let mut request = all_categories_request(TransportMode::Walking, 6);
    request.sensitivity = SensitivityProfile {
        cold: 3,
        heat: 3,
        humidity: 3,
    };

    let routes = generator.generate(&request).await.unwrap();

    assert_eq!(advisor.calls.load(Ordering::SeqCst), 6);
    let balanced = &routes[1];
    assert_eq!(balanced.route_type, RouteType::Balanced);
    assert_eq!(balanced.stops.len(), 6);
}

#[tokio::test]
async fn test_unsuitable_weather_excludes_only_exposed_places() {
    let exposed = WeatherImpact {
        cold: 0,
        heat: 2,
        humidity: 0,
    };
    let places = vec![
        create_test_place("museum", PlaceCategory::Culture, 12.0, 0.002),
        create_test_place("park", PlaceCategory::Leisure, 0.0, 0.004).with_weather_impact(exposed),
    ];
    let generator = RouteGenerator::new(
        Arc::new(InMemoryCatalog::new(places)),
        Arc::new(StormAdvisor),
        RouteGeneratorConfig::default(),
    );

    let routes = generator
        .generate(&all_categories_request(TransportMode::Walking, 2))
        .await
        .unwrap();

    assert_eq!(routes[1].place_ids(), vec!["museum"]);
}

#[tokio::test]
async fn test_walking_culture_trip_in_paris() {
    let places = [5.0, 8.0, 12.0, 20.0, 3.0]
        .iter()
        .enumerate()
        .map(|(idx, cost)| {
            create_test_place(
                &format!("culture-{}", idx),
                PlaceCategory::Culture,
                *cost,
                0.002 * (idx as f64 + 1.0),
            )
        })
        .collect();
    let generator = generator_with(places);

    let mut request = GenerationRequest::new(paris(), vec![PlaceCategory::Culture], 3);
    request.max_budget = Some(100.0);
    request.mode = TransportMode::Walking;

    let routes = generator.generate(&request).await.unwrap();
    let economic = &routes[0];

    assert_eq!(economic.route_type, RouteType::Economic);
    assert_eq!(economic.stops.len(), 3);
    let costs: Vec<f64> = economic.stops.iter().map(|s| s.cost).collect();
    assert_eq!(costs, vec![3.0, 5.0, 8.0]);
    assert!(economic.stops.iter().all(|s| s.transport_cost == 0.0));
    assert!(routes.iter().all(|r| !r.exceeds_budget));
}

#[tokio::test]
async fn test_car_trip_charges_every_leg() {
    // ~3 km between the two restaurants
    let first = create_test_place("brasserie", PlaceCategory::Restaurant, 15.0, 0.01);
    let second = create_test_place("etoile", PlaceCategory::Restaurant, 25.0, 0.01 + 0.02698);
    let estimator = DistanceEstimator::new();
    let origin_leg = estimator.distance(&paris(), &first.coordinates);
    let between = estimator.distance(&first.coordinates, &second.coordinates);
    assert!((between - 3.0).abs() < 0.05);

    let generator = generator_with(vec![first, second]);
    let mut request = GenerationRequest::new(paris(), vec![PlaceCategory::Restaurant], 2);
    request.mode = TransportMode::Car;

    let routes = generator.generate(&request).await.unwrap();
    let balanced = &routes[1];

    let expected = 15.0 + 25.0 + (origin_leg * 0.10 + 3.0) + (between * 0.10 + 3.0);
    assert_eq!(balanced.place_ids(), vec!["brasserie", "etoile"]);
    assert!(
        (balanced.total_budget - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        balanced.total_budget
    );

    // both restaurants cost more than the economic ceiling
    assert!(routes[0].stops.is_empty());
}

#[tokio::test]
async fn test_empty_categories_rejected_before_catalog_call() {
    let catalog = Arc::new(UnreachableCatalog::default());
    let generator = RouteGenerator::new(
        catalog.clone(),
        Arc::new(BrokenAdvisor::default()),
        RouteGeneratorConfig::default(),
    );

    let request = GenerationRequest::new(paris(), vec![], 3);
    let err = generator.generate(&request).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidRequest(_)), "got {:?}", err);
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_required_place_overrides_economic_ceiling() {
    let places = vec![
        create_test_place("P1", PlaceCategory::Culture, 50.0, 0.002),
        create_test_place("P2", PlaceCategory::Culture, 4.0, 0.004),
        create_test_place("P3", PlaceCategory::Culture, 9.0, 0.006),
    ];
    let generator = generator_with(places);

    let mut request = GenerationRequest::new(paris(), vec![PlaceCategory::Culture], 3);
    request.required_place_ids = vec!["P1".to_string()];

    let routes = generator.generate(&request).await.unwrap();
    let economic = &routes[0];

    assert_eq!(economic.place_ids(), vec!["P1", "P2", "P3"]);
    assert_eq!(economic.stops[0].notes.as_deref(), Some("Requested by the traveller"));
}

#[tokio::test]
async fn test_regenerate_returns_fresh_routes() {
    let generator = generator_with(mixed_pool());
    let request = all_categories_request(TransportMode::Walking, 3);

    let first = generator.generate(&request).await.unwrap();
    let second = generator.regenerate(&request).await.unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_ne!(a.id, b.id);
        assert_eq!(a.place_ids(), b.place_ids());
    }
}
