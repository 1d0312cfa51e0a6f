//! Entity module - Contains all SeaORM entity definitions for the record store.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod comanda;
pub mod customer;
pub mod payment;
pub mod product;
pub mod product_group;
pub mod product_subgroup;
pub mod sale;
pub mod sale_item;

// Re-export specific types to avoid conflicts
pub use comanda::{
    Column as ComandaColumn, ComandaStatus, Entity as Comanda, Model as ComandaModel,
};
pub use customer::{Column as CustomerColumn, Entity as Customer, Model as CustomerModel};
pub use payment::{
    Column as PaymentColumn, Entity as Payment, Model as PaymentModel, PaymentMethod,
};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use product_group::{
    Column as ProductGroupColumn, Entity as ProductGroup, Model as ProductGroupModel,
};
pub use product_subgroup::{
    Column as ProductSubgroupColumn, Entity as ProductSubgroup, Model as ProductSubgroupModel,
};
pub use sale::{Column as SaleColumn, Entity as Sale, Model as SaleModel};
pub use sale_item::{Column as SaleItemColumn, Entity as SaleItem, Model as SaleItemModel};
