use sea_orm::entity::prelude::*;

/// A product offered by a network entity. Rows cascade away with the
/// owning entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub network_entity_id: i32,
    pub name: String,
    pub model: String,
    /// Date the product reached the market.
    pub release_date: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::network_entity::Entity",
        from = "Column::NetworkEntityId",
        to = "super::network_entity::Column::Id"
    )]
    NetworkEntity,
}

impl Related<super::network_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NetworkEntity.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
