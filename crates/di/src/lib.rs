//! Keyed DI registry
//!
//! Контейнер хранит provider'ы под ключом (тип, опциональное имя) и
//! разрешает их по запросу. Provider решает, как получить значение:
//! готовый экземпляр, singleton factory, transient factory или своя
//! стратегия через trait `Provider`.
//!
//! ```
//! use di::Container;
//! use std::sync::Arc;
//!
//! struct Database { url: String }
//! struct Repository { db: Arc<Database> }
//!
//! let container = Container::new();
//! container.register_instance(Database { url: "sqlite::memory:".into() });
//! container.register_singleton(|r| Repository { db: r.resolve::<Database>() });
//!
//! let repo = container.resolve::<Repository>();
//! assert_eq!(repo.db.url, "sqlite::memory:");
//! ```

pub mod config;
pub mod container;
pub mod errors;
pub mod expiring;
pub mod global;
pub mod injected;
pub mod key;
pub mod provider;
pub mod resolver;
mod store;

pub use config::{ConfigLoader, ContainerConfig};
pub use container::{Container, ContainerStats};
pub use errors::{DIError, DIResult};
pub use expiring::ExpiringFactory;
pub use global::global;
pub use injected::Injected;
pub use key::TypeKey;
pub use provider::{CachedFactory, FactoryFn, FixedValue, Provider, TransientFactory};
pub use resolver::{ErasedValue, Resolver};
