// Repositories module - data access layer

pub mod cart_repository;
pub mod database;
pub mod product_repository;
pub mod user_repository;


pub use cart_repository::{CartRepository, SqlCartRepository};
pub use database::Database;
pub use product_repository::{ProductRepository, SqlProductRepository};
pub use user_repository::{SqlUserRepository, UserRepository};
