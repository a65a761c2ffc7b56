use std::collections::HashMap;

use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, EntityTrait};

/// A node in the electronics distribution network: a factory, a distributor
/// or a retail point. Nodes are linked by a single optional `supplier`
/// relation forming the hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "network_entities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Self-referencing foreign key to the immediate supplier.
    /// Set to NULL when the supplier is deleted.
    pub supplier_id: Option<i32>,
    /// Amount owed to the immediate supplier. Never written from client
    /// payloads; only the back-office clear-debt operation changes it.
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub debt: Decimal,
    /// Set once at creation.
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Defines the self-referencing relationship to the supplier node.
    #[sea_orm(belongs_to = "Entity", from = "Column::SupplierId", to = "Column::Id")]
    Supplier,
    #[sea_orm(has_one = "super::contact::Entity")]
    Contact,
    #[sea_orm(has_many = "super::product::Entity")]
    Product,
}

// Implement Related trait for self-referencing relationship
impl Related<Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }

    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::contact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contact.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Hierarchy level of this node, derived at query time from at most two
    /// hops up the supplier chain: 0 with no supplier, 1 when the supplier
    /// is itself a root, 2 otherwise. Deeper ancestry never raises the
    /// level; cycles are not detected and simply resolve through the same
    /// two-hop walk.
    pub async fn hierarchy_level(&self, db: &DatabaseConnection) -> Result<i32, DbErr> {
        let Some(supplier_id) = self.supplier_id else {
            return Ok(0);
        };

        match Entity::find_by_id(supplier_id).one(db).await? {
            Some(supplier) if supplier.supplier_id.is_some() => Ok(2),
            _ => Ok(1),
        }
    }
}

/// Same derivation as [`Model::hierarchy_level`] but against an in-memory
/// id -> supplier_id map, for list endpoints that already loaded every node
/// and should not walk the chain once per row.
pub fn level_from_links(
    supplier_id: Option<i32>,
    supplier_links: &HashMap<i32, Option<i32>>,
) -> i32 {
    match supplier_id {
        None => 0,
        Some(id) => match supplier_links.get(&id) {
            Some(Some(_)) => 2,
            _ => 1,
        },
    }
}
