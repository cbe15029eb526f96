//! Общий контейнер процесса
//!
//! Создается при первом обращении и живет до завершения процесса.
//! Настройки берутся из окружения (`DI_*`, см. `ConfigLoader`).

use once_cell::sync::Lazy;
use tracing::warn;

use crate::{
    config::{ConfigLoader, ContainerConfig},
    container::Container,
};

static GLOBAL_CONTAINER: Lazy<Container> =
    Lazy::new(|| Container::with_config(load_shared_config(&ConfigLoader::new())));

/// Невалидная конфигурация не должна ронять первое разрешение
fn load_shared_config(loader: &ConfigLoader) -> ContainerConfig {
    loader.load().unwrap_or_else(|e| {
        warn!("⚠️ Invalid shared container config, using defaults: {:#}", e);
        ContainerConfig::default()
    })
}

/// Общий контейнер. Тот же API, что и у любого `Container`.
pub fn global() -> &'static Container {
    &GLOBAL_CONTAINER
}
