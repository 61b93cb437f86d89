use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    // Foreign key to customer
    pub customer_id: i64,

    pub make: String,

    pub year: i32,

    pub vin: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer_entity::Entity",
        from = "Column::CustomerId",
        to = "super::customer_entity::Column::Id"
    )]
    Customer,
}

impl Related<super::customer_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[allow(dead_code)]
pub fn vehicle(id: i64, customer_id: i64, make: &str, year: i32) -> Model {
    Model {
        id,
        customer_id,
        make: make.to_string(),
        year,
        vin: format!("VIN{id:06}"),
    }
}
