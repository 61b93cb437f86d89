use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{Condition, JoinType, QuerySelect, Select, entity::prelude::*};
use searchcrate::{
    ChildFanOut, EntityMetamodel, Filters, JoinedColumnDef, PredicateBuilder, ScalarKind,
    SearchResource, SearchResult, and, or,
};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    pub name: String,

    pub email: String,

    pub tier: String,

    pub score: i32,

    pub active: bool,

    pub created_at: NaiveDateTime,

    pub birth_date: NaiveDate,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vehicle_entity::Entity")]
    Vehicles,
}

impl Related<super::vehicle_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn customer_attributes() -> Vec<(&'static str, Column)> {
    vec![
        ("id", Column::Id),
        ("name", Column::Name),
        ("email", Column::Email),
        ("tier", Column::Tier),
        ("score", Column::Score),
        ("active", Column::Active),
        ("created_at", Column::CreatedAt),
        ("birth_date", Column::BirthDate),
    ]
}

/// Customers searched on their own columns only.
pub struct Customers;

impl EntityMetamodel for Customers {
    type EntityType = Entity;
    type Id = i64;

    const ID_COLUMN: Column = Column::Id;

    fn attributes() -> Vec<(&'static str, Column)> {
        customer_attributes()
    }
}

impl SearchResource for Customers {
    const RESOURCE_NAME_PLURAL: &'static str = "customers";
    const CREATE_DATE_COLUMN: Column = Column::CreatedAt;

    fn build_predicate(
        b: &PredicateBuilder<'_, Self>,
        _params: &Filters,
    ) -> SearchResult<Option<Condition>> {
        Ok(and([
            b.contains("name", Some("nameContains"))?,
            b.not_contains("name", Some("nameExcludes"))?,
            b.starts_with("email", Some("emailStartsWith"))?,
            b.ends_with("email", Some("emailEndsWith"))?,
            b.equals("tier", None)?,
            b.is_in("tier", Some("tiers"))?,
            b.is_in("id", Some("ids"))?,
            b.not_in("id", Some("excludedIds"))?,
            b.filter_is_true("active", None)?,
            b.filter_is_false("active", None)?,
            b.number_between("score", None)?,
            b.date_time_between("created_at", Some("createdAt"))?,
            b.date_between("birth_date", Some("birthDate"))?,
            or([
                b.search(&["name", "email"])?,
                b.search_numeric(&["score"])?,
                b.search_boolean(&["active"])?,
                b.search_dates(&["birth_date"])?,
            ]),
        ]))
    }

    fn enhanced_properties() -> HashMap<&'static str, &'static str> {
        HashMap::from([("customerName", "name")])
    }
}

/// Customers filtered and sorted through their vehicles, declaring at most `FAN_OUT`
/// vehicles per customer.
pub struct CustomersWithVehicles<const FAN_OUT: u64>;

impl<const FAN_OUT: u64> EntityMetamodel for CustomersWithVehicles<FAN_OUT> {
    type EntityType = Entity;
    type Id = i64;

    const ID_COLUMN: Column = Column::Id;

    fn attributes() -> Vec<(&'static str, Column)> {
        customer_attributes()
    }

    fn joined_attributes() -> Vec<JoinedColumnDef> {
        vec![
            JoinedColumnDef::new("vehicles", "make", "vehicles.make", ScalarKind::String),
            JoinedColumnDef::new("vehicles", "year", "vehicles.year", ScalarKind::Int),
        ]
    }
}

impl<const FAN_OUT: u64> SearchResource for CustomersWithVehicles<FAN_OUT> {
    const RESOURCE_NAME_PLURAL: &'static str = "customers";
    const CREATE_DATE_COLUMN: Column = Column::CreatedAt;

    fn build_predicate(
        b: &PredicateBuilder<'_, Self>,
        _params: &Filters,
    ) -> SearchResult<Option<Condition>> {
        Ok(and([
            b.equals("vehicles.make", Some("vehicleMake"))?,
            b.number_from("vehicles.year", Some("vehicleYear"))?,
            b.contains("name", Some("nameContains"))?,
        ]))
    }

    fn enhanced_properties() -> HashMap<&'static str, &'static str> {
        HashMap::from([("vehicleYear", "vehicles.year")])
    }

    fn joins(select: Select<Entity>) -> Select<Entity> {
        select.join(JoinType::LeftJoin, Relation::Vehicles.def())
    }

    fn max_children_per_parent() -> ChildFanOut {
        ChildFanOut::Bound(FAN_OUT)
    }
}

#[allow(dead_code)]
pub fn customer(id: i64, name: &str, tier: &str, score: i32, active: bool, created_at: &str, birth_date: &str) -> Model {
    Model {
        id,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        tier: tier.to_string(),
        score,
        active,
        created_at: NaiveDateTime::parse_from_str(created_at, "%Y-%m-%d %H:%M").unwrap(),
        birth_date: NaiveDate::parse_from_str(birth_date, "%Y-%m-%d").unwrap(),
    }
}
