//! Row types for the six schema tables.
//!
//! Rows decode straight into domain newtypes, so a value that breaks a core
//! invariant (negative cents, zero quantity, unknown status) surfaces as a
//! decode error rather than a silently wrong struct.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem, NewCartItem};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use product::{NewProduct, Product};
pub use user::{NewUser, User};
