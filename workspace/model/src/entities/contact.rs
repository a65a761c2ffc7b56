use sea_orm::entity::prelude::*;

/// Contact information for a network entity. Exactly one row per entity;
/// the foreign key carries a unique constraint and cascades on delete.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub network_entity_id: i32,
    pub email: String,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
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
