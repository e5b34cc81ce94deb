pub mod models;
pub mod store;
pub mod memory;
pub mod error;
pub mod dbs;

pub use models::{ThreadItems, AuthorItems};
pub use store::ItemStore;
pub use memory::InMemoryStore;
pub use error::{PersistError, Result};

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoItemStore;
