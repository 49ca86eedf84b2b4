use super::*;
use crate::models::{Coordinates, RouteType, TransportMode};
use sqlx::sqlite::SqlitePoolOptions;

async fn setup_pool() -> SqlitePool {
    // a single connection keeps every query on the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    create_schema(&pool).await.expect("Failed to create schema");
    pool
}

fn make_place(id: &str, category: PlaceCategory, lat: f64, lng: f64) -> Place {
    Place::new(id, format!("Place {id}"), category, Coordinates::new(lat, lng).unwrap())
        .with_average_cost(8.0)
        .with_wait_minutes(5)
}

fn make_route(place: Place) -> Route {
    let stop = Stop {
        id: Uuid::new_v4(),
        place,
        order: 1,
        time_slot: crate::models::TimeSlot::Morning,
        estimated_duration_minutes: 65,
        distance_from_previous_km: 1.2,
        travel_minutes: 14,
        transport_cost: 0.0,
        cost: 8.0,
        notes: None,
    };
    Route::new(RouteType::Economic, TransportMode::Walking, Some("Paris".into()), vec![stop])
}

#[tokio::test]
async fn create_schema_idempotent() {
    let pool = setup_pool().await;
    create_schema(&pool).await.unwrap();
}

#[tokio::test]
async fn places_insert_count_and_bbox() {
    let repo = SqlitePlaceRepository::new(setup_pool().await);
    assert_eq!(repo.count().await.unwrap(), 0);

    let inserted = repo
        .insert_batch(&[
            make_place("a", PlaceCategory::Culture, 48.86, 2.34),
            make_place("b", PlaceCategory::Culture, 48.87, 2.35),
            make_place("c", PlaceCategory::Restaurant, 48.86, 2.34),
            make_place("far", PlaceCategory::Culture, 45.76, 4.83),
            make_place("a", PlaceCategory::Culture, 48.86, 2.34),
        ])
        .await
        .unwrap();
    assert_eq!(inserted, 4);
    assert_eq!(repo.count().await.unwrap(), 4);

    let center = Coordinates::new(48.8566, 2.3522).unwrap();
    let bbox = BoundingBox::from_center_radius(&center, 5.0);
    let culture = repo.find_in_bbox(&bbox, PlaceCategory::Culture, 10).await.unwrap();

    let ids: Vec<&str> = culture.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(culture[0].estimated_wait_minutes, Some(5));
}

#[tokio::test]
async fn corrupt_place_rows_are_not_returned() {
    let pool = setup_pool().await;
    sqlx::query(
        "INSERT INTO places (id, name, category, lat, lng, average_cost)
         VALUES ('neg', 'Negative', 'CULTURE', 48.86, 2.34, -4.0)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let repo = SqlitePlaceRepository::new(pool);
    repo.insert(&make_place("ok", PlaceCategory::Culture, 48.86, 2.34))
        .await
        .unwrap();

    let places = repo
        .find_in_bbox(&BoundingBox::WORLD, PlaceCategory::Culture, 10)
        .await
        .unwrap();
    assert_eq!(places.len(), 1);
    assert_eq!(places[0].id, "ok");
}

#[tokio::test]
async fn route_save_get_roundtrip() {
    let store = SqliteRouteStore::new(setup_pool().await);
    let route = make_route(make_place("a", PlaceCategory::Culture, 48.86, 2.34));

    store.save(&route, Some("alice")).await.unwrap();
    let loaded = store.get(route.id).await.unwrap();

    assert!(loaded.is_saved);
    assert_eq!(loaded.route_type, RouteType::Economic);
    assert_eq!(loaded.stops.len(), 1);
    assert_eq!(loaded.stops[0].place.id, "a");
    assert_eq!(loaded.total_duration_minutes, 65);
}

#[tokio::test]
async fn route_save_twice_does_not_duplicate() {
    let store = SqliteRouteStore::new(setup_pool().await);
    let mut route = make_route(make_place("a", PlaceCategory::Culture, 48.86, 2.34));

    store.save(&route, Some("alice")).await.unwrap();
    route.name = "Sunday walk".to_string();
    store.save(&route, Some("alice")).await.unwrap();

    let routes = store.list(Some("alice")).await.unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].name, "Sunday walk");
}

#[tokio::test]
async fn route_ownership_is_enforced() {
    let store = SqliteRouteStore::new(setup_pool().await);
    let route = make_route(make_place("a", PlaceCategory::Culture, 48.86, 2.34));
    store.save(&route, Some("alice")).await.unwrap();

    assert!(matches!(
        store.set_favorite(route.id, Some("bob"), true).await,
        Err(AppError::NotFound(_))
    ));
    assert!(store.set_favorite(route.id, Some("alice"), true).await.unwrap().is_favorite);

    assert!(matches!(store.delete(route.id, None).await, Err(AppError::NotFound(_))));
    store.delete(route.id, Some("alice")).await.unwrap();
    assert!(store.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn route_resave_cannot_change_owner() {
    let store = SqliteRouteStore::new(setup_pool().await);
    let mut route = make_route(make_place("a", PlaceCategory::Culture, 48.86, 2.34));
    store.save(&route, Some("alice")).await.unwrap();

    route.name = "Hijacked".to_string();
    assert!(matches!(
        store.save(&route, Some("eve")).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(store.save(&route, None).await, Err(AppError::NotFound(_))));

    let routes = store.list(Some("alice")).await.unwrap();
    assert_eq!(routes.len(), 1);
    assert_ne!(routes[0].name, "Hijacked");
    assert!(store.delete(route.id, Some("eve")).await.is_err());
}

#[tokio::test]
async fn ownerless_route_can_be_claimed() {
    let store = SqliteRouteStore::new(setup_pool().await);
    let route = make_route(make_place("a", PlaceCategory::Culture, 48.86, 2.34));
    store.save(&route, None).await.unwrap();

    store.save(&route, Some("alice")).await.unwrap();
    assert_eq!(store.list(Some("alice")).await.unwrap().len(), 1);
}
