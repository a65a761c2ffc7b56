//! This file serves as the root for all SeaORM entity modules.
//! We define the data models for the distribution-network application here:
//! the network entities themselves, their contact and product records, and
//! the employee accounts used by the auth layer.

pub mod contact;
pub mod network_entity;
pub mod product;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::contact::Entity as Contact;
    pub use super::network_entity::Entity as NetworkEntity;
    pub use super::product::Entity as Product;
    pub use super::user::Entity as User;
}
