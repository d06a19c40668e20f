//! [`DataView`](crate::core::DataView) implementations for the stores supported out of the box.

pub mod entity;
pub mod memory;

pub use entity::EntityView;
#[cfg(feature = "sqlite")]
pub use entity::connect_sqlite;
pub use memory::MemoryView;
