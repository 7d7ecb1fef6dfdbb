//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod dish;
pub mod order;
pub mod order_item;
pub mod session_state;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use dish::{Column as DishColumn, Entity as Dish, Model as DishModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use session_state::{
    Column as SessionStateColumn, Entity as SessionState, Model as SessionStateModel,
};
