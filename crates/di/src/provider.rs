//! Provider - стратегия получения значения
//!
//! Контейнер не знает, КАК строится значение: это решает provider.
//! Встроенные варианты:
//! - `FixedValue` - уже построенный экземпляр
//! - `CachedFactory` - factory вызывается один раз, результат кэшируется навсегда
//! - `TransientFactory` - factory вызывается при каждом разрешении
//!
//! Любой внешний тип может реализовать `Provider` со своей политикой
//! кэширования (см. `ExpiringFactory`).

use std::{
    any::TypeId,
    fmt,
    sync::Arc,
};

use parking_lot::Mutex;

use crate::resolver::{ErasedValue, Resolver};

/// Factory функция: получает resolver для своих зависимостей
pub type FactoryFn<T> = Box<dyn Fn(&dyn Resolver) -> Arc<T> + Send + Sync>;

/// Стратегия получения значения типа `Self::Value`.
///
/// `provide` принимает `&mut self`: provider может сохранять построенные
/// значения. Контейнер держит каждый provider за собственным mutex, поэтому
/// вызовы `provide` одного provider'а никогда не пересекаются.
///
/// Mutex удерживается на все время `provide`: медленный provider блокирует
/// всех, кто разрешает тот же ключ, даже если состояния у него нет
/// (`FixedValue`, `TransientFactory`).
///
/// Внутри `provide` можно разрешать другие ключи через `resolver`.
/// Разрешение собственного ключа (прямо или через цикл зависимостей)
/// повисает навсегда: mutex не reentrant, циклы не обнаруживаются.
pub trait Provider: Send + 'static {
    /// Тип, под которым provider регистрируется
    type Value: ?Sized + Send + Sync + 'static;

    fn provide(&mut self, resolver: &dyn Resolver) -> Arc<Self::Value>;
}

/// Уже построенное значение
pub struct FixedValue<T: ?Sized> {
    value: Arc<T>,
}

impl<T: ?Sized> FixedValue<T> {
    pub fn new(value: Arc<T>) -> Self {
        Self { value }
    }
}

impl<T> FixedValue<T> {
    pub fn from_value(value: T) -> Self {
        Self::new(Arc::new(value))
    }
}

impl<T: ?Sized + Send + Sync + 'static> Provider for FixedValue<T> {
    type Value = T;

    fn provide(&mut self, _resolver: &dyn Resolver) -> Arc<T> {
        self.value.clone()
    }
}

/// Factory с кэшированием: первый вызов строит значение, остальные возвращают его же
pub struct CachedFactory<T: ?Sized> {
    cached: Option<Arc<T>>,
    factory: FactoryFn<T>,
}

impl<T: ?Sized> CachedFactory<T> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&dyn Resolver) -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            cached: None,
            factory: Box::new(factory),
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Provider for CachedFactory<T> {
    type Value = T;

    fn provide(&mut self, resolver: &dyn Resolver) -> Arc<T> {
        if let Some(cached) = &self.cached {
            return cached.clone();
        }

        let instance = (self.factory)(resolver);
        self.cached = Some(instance.clone());
        instance
    }
}

/// Factory без кэширования: новое значение при каждом разрешении
pub struct TransientFactory<T: ?Sized> {
    factory: FactoryFn<T>,
}

impl<T: ?Sized> TransientFactory<T> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&dyn Resolver) -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> Provider for TransientFactory<T> {
    type Value = T;

    fn provide(&mut self, resolver: &dyn Resolver) -> Arc<T> {
        (self.factory)(resolver)
    }
}

impl<T: ?Sized> fmt::Debug for FixedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedValue")
            .field("value_type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: ?Sized> fmt::Debug for CachedFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedFactory")
            .field("value_type", &std::any::type_name::<T>())
            .field("cached", &self.is_cached())
            .finish()
    }
}

impl<T: ?Sized> fmt::Debug for TransientFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransientFactory")
            .field("value_type", &std::any::type_name::<T>())
            .finish()
    }
}

/// Type-erased provider для хранения разнотипных provider'ов в одном store
pub(crate) trait ErasedProvider: Send {
    fn provide_erased(&mut self, resolver: &dyn Resolver) -> ErasedValue;

    fn value_type_id(&self) -> TypeId;

    fn value_type_name(&self) -> &'static str;

    fn provider_type_name(&self) -> &'static str;
}

impl<P: Provider> ErasedProvider for P {
    fn provide_erased(&mut self, resolver: &dyn Resolver) -> ErasedValue {
        Box::new(self.provide(resolver))
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<P::Value>()
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<P::Value>()
    }

    fn provider_type_name(&self) -> &'static str {
        std::any::type_name::<P>()
    }
}

/// Provider в store: общий между всеми вызывающими, с собственным mutex
pub(crate) type SharedProvider = Arc<Mutex<dyn ErasedProvider>>;

pub(crate) fn share<P: Provider>(provider: P) -> SharedProvider {
    Arc::new(Mutex::new(provider))
}
