pub mod models;
pub mod client;

pub use client::MongoItemStore;
