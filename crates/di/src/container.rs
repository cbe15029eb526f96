//! DI контейнер
//!
//! АРХИТЕКТУРНЫЕ РЕШЕНИЯ:
//! - `HashMap<TypeKey, provider>` за RwLock для O(1) поиска по (тип, имя)
//! - Provider'ы хранятся type-erased, тип проверяется при разрешении
//! - Каждый provider за своим mutex: `CachedFactory` строит значение
//!   ровно один раз даже при конкурентном первом разрешении
//! - Clone-able контейнер: клоны разделяют одно хранилище, отдельно
//!   созданные контейнеры полностью независимы

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    config::ContainerConfig,
    errors::{fatal, DIError, DIResult},
    key::TypeKey,
    provider::{share, CachedFactory, FixedValue, Provider, SharedProvider, TransientFactory},
    resolver::{resolve_typed, ErasedValue, Resolver},
    store::ProviderStore,
};

/// Статистика контейнера
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerStats {
    pub name: String,
    pub registered_providers: usize,
    pub resolutions: u64,
    pub failed_resolutions: u64,
}

struct ContainerInner {
    config: ContainerConfig,
    store: ProviderStore,
    resolutions: AtomicU64,
    failed_resolutions: AtomicU64,
}

/// Контейнер: владеет хранилищем provider'ов и реализует `Resolver`
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        debug!("🔧 Creating container '{}'", config.name);
        Self {
            inner: Arc::new(ContainerInner {
                config,
                store: ProviderStore::new(),
                resolutions: AtomicU64::new(0),
                failed_resolutions: AtomicU64::new(0),
            }),
        }
    }

    /// Общий контейнер процесса
    pub fn shared() -> &'static Container {
        crate::global::global()
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    // === Регистрация ===

    /// Зарегистрировать provider под его типом `P::Value`
    pub fn register_provider<P: Provider>(&self, provider: P) {
        self.insert(TypeKey::of::<P::Value>(), share(provider));
    }

    pub fn register_provider_named<P: Provider>(&self, name: impl Into<String>, provider: P) {
        self.insert(TypeKey::named::<P::Value>(name), share(provider));
    }

    /// Зарегистрировать готовый экземпляр
    pub fn register_instance<T>(&self, instance: T)
    where
        T: Send + Sync + 'static,
    {
        self.register_provider(FixedValue::from_value(instance));
    }

    pub fn register_instance_named<T>(&self, name: impl Into<String>, instance: T)
    where
        T: Send + Sync + 'static,
    {
        self.register_provider_named(name, FixedValue::from_value(instance));
    }

    /// Зарегистрировать уже созданный `Arc`.
    ///
    /// `T` может быть `dyn Trait`: `Arc<English>` приводится к
    /// `Arc<dyn Greeter>` и регистрируется под `dyn Greeter`.
    pub fn register_shared<T>(&self, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_provider(FixedValue::new(instance));
    }

    pub fn register_shared_named<T>(&self, name: impl Into<String>, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_provider_named(name, FixedValue::new(instance));
    }

    /// Зарегистрировать singleton: factory вызывается один раз при первом разрешении
    pub fn register_singleton<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> T + Send + Sync + 'static,
    {
        self.register_provider(CachedFactory::new(move |r| Arc::new(factory(r))));
    }

    pub fn register_singleton_named<T, F>(&self, name: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> T + Send + Sync + 'static,
    {
        self.register_provider_named(name, CachedFactory::new(move |r| Arc::new(factory(r))));
    }

    /// Зарегистрировать transient: factory вызывается при каждом разрешении
    pub fn register_transient<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> T + Send + Sync + 'static,
    {
        self.register_provider(TransientFactory::new(move |r| Arc::new(factory(r))));
    }

    pub fn register_transient_named<T, F>(&self, name: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> T + Send + Sync + 'static,
    {
        self.register_provider_named(name, TransientFactory::new(move |r| Arc::new(factory(r))));
    }

    // === Разрешение ===

    /// Разрешить зависимость.
    ///
    /// # Panics
    ///
    /// Если provider не зарегистрирован или производит другой тип.
    /// Незарегистрированная зависимость - ошибка конфигурации, а не
    /// runtime-состояние.
    #[track_caller]
    pub fn resolve<T>(&self) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.try_resolve::<T>() {
            Ok(value) => value,
            Err(error) => fatal(error),
        }
    }

    #[track_caller]
    pub fn resolve_named<T>(&self, name: &str) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.try_resolve_named::<T>(name) {
            Ok(value) => value,
            Err(error) => fatal(error),
        }
    }

    /// Попытаться разрешить зависимость
    pub fn try_resolve<T>(&self) -> DIResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        resolve_typed(self, &TypeKey::of::<T>())
    }

    pub fn try_resolve_named<T>(&self, name: &str) -> DIResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        resolve_typed(self, &TypeKey::named::<T>(name))
    }

    // === Диагностика ===

    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.inner.store.contains(&TypeKey::of::<T>())
    }

    pub fn is_registered_named<T: ?Sized + 'static>(&self, name: &str) -> bool {
        self.inner.store.contains(&TypeKey::named::<T>(name))
    }

    pub fn service_count(&self) -> usize {
        self.inner.store.len()
    }

    /// Список зарегистрированных ключей (для отладки)
    pub fn registered_keys(&self) -> Vec<TypeKey> {
        self.inner.store.keys()
    }

    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            name: self.name().to_string(),
            registered_providers: self.service_count(),
            resolutions: self.inner.resolutions.load(Ordering::Relaxed),
            failed_resolutions: self.inner.failed_resolutions.load(Ordering::Relaxed),
        }
    }

    fn insert(&self, key: TypeKey, provider: SharedProvider) {
        let provider_type = provider.lock().provider_type_name();
        let replaced = self.inner.store.set(key.clone(), provider);

        if replaced.is_some() {
            if self.inner.config.warn_on_overwrite {
                warn!("Type {} is already registered in '{}', overwriting", key, self.name());
            } else {
                debug!("Overwrote {} in '{}'", key, self.name());
            }
        }
        debug!("Registered {} via {} in '{}'", key, provider_type, self.name());
    }

    fn provide(&self, key: &TypeKey) -> DIResult<ErasedValue> {
        // Lock store отпускается внутри get(), до вызова provide
        let provider = self
            .inner
            .store
            .get(key)
            .ok_or_else(|| DIError::not_found(key, self.name()))?;

        let mut provider = provider.lock();
        if provider.value_type_id() != key.type_id() {
            return Err(DIError::mismatch(key, provider.value_type_name()));
        }

        let value = provider.provide_erased(self);
        if self.inner.config.trace_resolutions {
            debug!("🔍 Resolved {} from '{}'", key, self.name());
        }
        Ok(value)
    }
}

impl Resolver for Container {
    fn resolve_key(&self, key: &TypeKey) -> DIResult<ErasedValue> {
        let result = self.provide(key);
        let counter = match result {
            Ok(_) => &self.inner.resolutions,
            Err(_) => &self.inner.failed_resolutions,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        result
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name())
            .field("services", &self.service_count())
            .finish()
    }
}
