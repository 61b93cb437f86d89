use sea_orm::{Database, DatabaseConnection, DbErr, EntityTrait, Schema};
use sea_orm_migration::prelude::*;

pub mod customer_entity;
pub mod vehicle_entity;

use customer_entity::customer;
use vehicle_entity::vehicle;

// Helper function to get database URL from environment or default to SQLite
fn get_test_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

#[allow(dead_code)]
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(get_test_database_url()).await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Five customers with distinct names, scores, activity and dates.
///
/// | id | name   | tier   | score | active | created          | born       |
/// |----|--------|--------|-------|--------|------------------|------------|
/// | 1  | Alpha  | gold   | 42    | yes    | 2024-01-01 09:00 | 1990-03-15 |
/// | 2  | beta   | silver | 7     | no     | 2024-01-02 10:30 | 1985-07-04 |
/// | 3  | Alpha2 | gold   | 142   | yes    | 2024-01-03 11:45 | 2001-11-23 |
/// | 4  | Delta  | bronze | 7     | yes    | 2024-01-04 12:00 | 1978-01-30 |
/// | 5  | Echo   | silver | 99    | no     | 2024-01-05 13:15 | 1995-12-01 |
///
/// Customer 3 has the email `agent007@example.com`.
#[allow(dead_code)]
pub async fn seed_customers(db: &DatabaseConnection) -> Result<(), DbErr> {
    let customers = vec![
        customer(1, "Alpha", "gold", 42, true, "2024-01-01 09:00", "1990-03-15"),
        customer(2, "beta", "silver", 7, false, "2024-01-02 10:30", "1985-07-04"),
        customer_entity::Model {
            email: "agent007@example.com".to_string(),
            ..customer(3, "Alpha2", "gold", 142, true, "2024-01-03 11:45", "2001-11-23")
        },
        customer(4, "Delta", "bronze", 7, true, "2024-01-04 12:00", "1978-01-30"),
        customer(5, "Echo", "silver", 99, false, "2024-01-05 13:15", "1995-12-01"),
    ];
    insert_customers(db, customers).await
}

/// P1 (newest) has three Toyotas, P2 one Toyota, P3 one Ford.
#[allow(dead_code)]
pub async fn seed_parents_with_children(db: &DatabaseConnection) -> Result<(), DbErr> {
    insert_customers(
        db,
        vec![
            customer(1, "P1", "gold", 10, true, "2024-03-03 12:00", "1990-01-01"),
            customer(2, "P2", "gold", 20, true, "2024-03-02 12:00", "1990-01-01"),
            customer(3, "P3", "gold", 30, true, "2024-03-01 12:00", "1990-01-01"),
        ],
    )
    .await?;
    insert_vehicles(
        db,
        vec![
            vehicle(1, 1, "Toyota", 2020),
            vehicle(2, 1, "Toyota", 2021),
            vehicle(3, 1, "Toyota", 2022),
            vehicle(4, 2, "Toyota", 2019),
            vehicle(5, 3, "Ford", 2023),
        ],
    )
    .await
}

/// `count` customers created one day apart (customer 1 oldest), each with two Toyotas.
/// Customer `n` owns model years `2000 + 2n` and `2001 + 2n`, so higher ids own newer cars.
#[allow(dead_code)]
pub async fn seed_fleet(db: &DatabaseConnection, count: i64) -> Result<(), DbErr> {
    let customers = (1..=count)
        .map(|id| {
            let created = format!("2024-02-{id:02} 08:00");
            customer(id, &format!("Fleet{id}"), "gold", 1, true, &created, "1990-01-01")
        })
        .collect();
    insert_customers(db, customers).await?;

    let vehicles = (1..=count)
        .flat_map(|id| {
            let year = <i32 as TryFrom<i64>>::try_from(2000 + 2 * id).unwrap();
            [
                vehicle(id * 10, id, "Toyota", year),
                vehicle(id * 10 + 1, id, "Toyota", year + 1),
            ]
        })
        .collect();
    insert_vehicles(db, vehicles).await
}

async fn insert_customers(db: &DatabaseConnection, customers: Vec<customer_entity::Model>) -> Result<(), DbErr> {
    customer_entity::Entity::insert_many(customers.into_iter().map(customer_entity::ActiveModel::from))
        .exec(db)
        .await?;
    Ok(())
}

async fn insert_vehicles(db: &DatabaseConnection, vehicles: Vec<vehicle_entity::Model>) -> Result<(), DbErr> {
    vehicle_entity::Entity::insert_many(vehicles.into_iter().map(vehicle_entity::ActiveModel::from))
        .exec(db)
        .await?;
    Ok(())
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateCustomerTables)]
    }
}

pub struct CreateCustomerTables;

#[async_trait::async_trait]
impl MigrationName for CreateCustomerTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_customer_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateCustomerTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());
        manager
            .create_table(
                schema
                    .create_table_from_entity(customer_entity::Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(vehicle_entity::Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(vehicle_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(customer_entity::Entity).to_owned())
            .await?;
        Ok(())
    }
}
