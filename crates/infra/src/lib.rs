//! Kitchen service layer: actor-scoped stores, configuration, and the request
//! handler that runs domain operations against them.

pub mod config;
pub mod error;
pub mod kitchen;
pub mod store;

pub use config::{ConfigError, KitchenConfig};
pub use error::{KitchenError, KitchenResult};
pub use kitchen::{Kitchen, KitchenStores};
pub use store::{ActorStore, InMemoryActorStore, StoreError};

#[cfg(test)]
mod integration_tests;
