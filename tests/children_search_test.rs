// Parent-With-Children Search
// Tests paging distinct customers filtered and sorted through their joined vehicles

mod common;

use common::customer_entity::{self, CustomersWithVehicles};
use common::{seed_fleet, seed_parents_with_children, setup_test_db};
use sea_orm::DatabaseConnection;
use searchcrate::core::criteria_search_with_children;
use searchcrate::{Filters, Page, Pageable, SearchError, SearchRequest, SearchResource};
use serde_json::json;

fn request(filters: serde_json::Value, pageable: Pageable) -> SearchRequest {
    SearchRequest::new(Filters::from_json(&filters), pageable)
}

fn ids(page: &Page<customer_entity::Model>) -> Vec<i64> {
    page.items.iter().map(|customer| customer.id).collect()
}

async fn parents_db() -> DatabaseConnection {
    let db = setup_test_db().await.expect("Failed to setup test database");
    seed_parents_with_children(&db).await.expect("Failed to seed parents");
    db
}

async fn fleet_db(count: i64) -> DatabaseConnection {
    let db = setup_test_db().await.expect("Failed to setup test database");
    seed_fleet(&db, count).await.expect("Failed to seed fleet");
    db
}

#[tokio::test]
async fn test_parents_are_distinct_despite_child_fan_out() {
    let db = parents_db().await;

    let page = CustomersWithVehicles::<3>::search_with_children(
        &db,
        &request(json!({"vehicleMake": "Toyota"}), Pageable::new(0, 2)),
        &Filters::default(),
    )
    .await
    .unwrap();

    // Default sort is newest first; P1 joins three matching vehicles but appears once
    assert_eq!(ids(&page), vec![1, 2]);
    assert_eq!(page.total_elements, 2);
}

#[tokio::test]
async fn test_parents_without_matching_children_are_counted_once() {
    let db = parents_db().await;

    let page = CustomersWithVehicles::<3>::search_with_children(
        &db,
        &request(json!({}), Pageable::new(0, 10)),
        &Filters::default(),
    )
    .await
    .unwrap();
    assert_eq!(ids(&page), vec![1, 2, 3]);
    assert_eq!(page.total_elements, 3);

    let page = CustomersWithVehicles::<3>::search_with_children(
        &db,
        &request(json!({"vehicleYearFrom": 2022}), Pageable::new(0, 10)),
        &Filters::default(),
    )
    .await
    .unwrap();
    assert_eq!(ids(&page), vec![1, 3]);
    assert_eq!(page.total_elements, 2);
}

#[tokio::test]
async fn test_unsorted_search_orders_by_creation_date() {
    let db = parents_db().await;

    let page = CustomersWithVehicles::<3>::search_with_children(
        &db,
        &request(json!({}), Pageable::new(0, 10)),
        &Filters::default(),
    )
    .await
    .unwrap();
    assert_eq!(ids(&page), vec![1, 2, 3]);
    assert_eq!(page.total_elements, 3);

    // A direction without a property still applies to the creation date
    let mut pageable = Pageable::new(0, 10);
    pageable.sort_direction.push("asc".to_string());
    let page = CustomersWithVehicles::<3>::search_with_children(
        &db,
        &request(json!({}), pageable),
        &Filters::default(),
    )
    .await
    .unwrap();
    assert_eq!(ids(&page), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_total_counts_distinct_parents() {
    let db = fleet_db(5).await;

    // Ten matching vehicle rows belong to five customers
    let page = CustomersWithVehicles::<2>::search_with_children(
        &db,
        &request(json!({"vehicleMake": "Toyota"}), Pageable::new(0, 1)),
        &Filters::default(),
    )
    .await
    .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_elements, 5);
    assert_eq!(page.total_pages(), 5);
    assert_eq!(page.content_range("customers"), "customers 0-0/5");
}

#[tokio::test]
async fn test_consecutive_pages_cover_every_parent_once() {
    let db = fleet_db(5).await;

    let mut seen = Vec::new();
    let mut sizes = Vec::new();
    for page_number in 0..3 {
        let pageable = Pageable::new(page_number, 2).with_sort("vehicleYear", "desc");
        let page = CustomersWithVehicles::<2>::search_with_children(
            &db,
            &request(json!({"vehicleMake": "Toyota"}), pageable),
            &Filters::default(),
        )
        .await
        .unwrap();
        assert_eq!(page.total_elements, 5);
        sizes.push(page.items.len());
        seen.extend(ids(&page));
    }

    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(seen, vec![5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn test_child_sort_order_is_restored_after_fetch() {
    let db = parents_db().await;

    // P2's only Toyota (2019) is older than any of P1's
    let pageable = Pageable::new(0, 2).with_sort("vehicles.year", "asc");
    let page = CustomersWithVehicles::<3>::search_with_children(
        &db,
        &request(json!({"vehicleMake": "Toyota"}), pageable),
        &Filters::default(),
    )
    .await
    .unwrap();
    assert_eq!(ids(&page), vec![2, 1]);
}

#[tokio::test]
async fn test_under_declared_fan_out_returns_short_page() {
    let db = parents_db().await;
    let filters = json!({"vehicleMake": "Toyota"});

    // A window of two rows holds only P1's 2022 and 2021 Toyotas
    let pageable = Pageable::new(0, 2).with_sort("vehicleYear", "desc");
    let page = CustomersWithVehicles::<1>::search_with_children(
        &db,
        &request(filters.clone(), pageable.clone()),
        &Filters::default(),
    )
    .await
    .unwrap();
    assert_eq!(ids(&page), vec![1]);
    assert_eq!(page.total_elements, 2);

    let page = CustomersWithVehicles::<3>::search_with_children(&db, &request(filters, pageable), &Filters::default())
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![1, 2]);
}

#[tokio::test]
async fn test_empty_windows_keep_the_total() {
    let db = parents_db().await;
    let filters = json!({"vehicleMake": "Toyota"});

    let page = CustomersWithVehicles::<3>::search_with_children(
        &db,
        &request(filters.clone(), Pageable::new(0, 0)),
        &Filters::default(),
    )
    .await
    .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total_elements, 2);

    let page = CustomersWithVehicles::<0>::search_with_children(
        &db,
        &request(filters.clone(), Pageable::new(0, 2)),
        &Filters::default(),
    )
    .await
    .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total_elements, 2);

    let page = CustomersWithVehicles::<3>::search_with_children(
        &db,
        &request(filters, Pageable::new(5, 2)),
        &Filters::default(),
    )
    .await
    .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total_elements, 2);
    assert_eq!(page.page_number, 5);
}

#[tokio::test]
async fn test_sort_direction_is_lenient() {
    let db = parents_db().await;

    for direction in ["sideways", "DESC", ""] {
        let pageable = Pageable::new(0, 10).with_sort("created_at", direction);
        let page = criteria_search_with_children::<CustomersWithVehicles<3>, _>(
            &db,
            &request(json!({}), pageable),
            &Filters::default(),
        )
        .await
        .unwrap();
        assert_eq!(ids(&page), vec![1, 2, 3], "direction {direction:?}");
    }

    let pageable = Pageable::new(0, 10).with_sort("created_at", "Asc");
    let page = criteria_search_with_children::<CustomersWithVehicles<3>, _>(
        &db,
        &request(json!({}), pageable),
        &Filters::default(),
    )
    .await
    .unwrap();
    assert_eq!(ids(&page), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_unknown_sort_attribute_is_rejected() {
    let db = parents_db().await;

    let pageable = Pageable::new(0, 10).with_sort("vehicles.colour", "desc");
    let result = CustomersWithVehicles::<3>::search_with_children(
        &db,
        &request(json!({}), pageable),
        &Filters::default(),
    )
    .await;
    assert!(matches!(result, Err(SearchError::UnknownAttribute(_))));
}
