//! Object-safe Resolver
//!
//! Provider получает `&dyn Resolver`, а не конкретный контейнер: так
//! provider не зависит от внутренностей контейнера, а factory может
//! рекурсивно запрашивать свои зависимости у того же контейнера.
//!
//! АРХИТЕКТУРНОЕ РЕШЕНИЕ:
//! - trait работает с type-erased значениями по `TypeKey`
//! - typed API (`resolve::<T>()`) живет в inherent impl на `dyn Resolver`
//!   и делает checked downcast

use std::{any::Any, sync::Arc};

use crate::{
    errors::{fatal, DIError, DIResult},
    key::TypeKey,
};

/// Type-erased значение: `Box`, внутри которого лежит `Arc<T>`
pub type ErasedValue = Box<dyn Any + Send + Sync>;

/// Способность найти и произвести значение по ключу
pub trait Resolver: Send + Sync {
    /// Разрешить зависимость по ключу. Возвращает `Arc<T>`, упакованный в `Box<dyn Any>`.
    fn resolve_key(&self, key: &TypeKey) -> DIResult<ErasedValue>;
}

impl dyn Resolver + '_ {
    /// Разрешить зависимость без имени. Panic, если зависимость не зарегистрирована.
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

    /// Разрешить именованную зависимость. Panic, если зависимость не зарегистрирована.
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
}

/// Разрешить ключ и выполнить checked downcast к `Arc<T>`
pub(crate) fn resolve_typed<T, R>(resolver: &R, key: &TypeKey) -> DIResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
    R: Resolver + ?Sized,
{
    let erased = resolver.resolve_key(key)?;
    downcast_value::<T>(key, erased)
}

/// Тип payload'а после стирания неизвестен, известно только что это не `Arc<T>`
const ERASED_PAYLOAD_MISMATCH: &str = "an erased value that is not Arc<requested>";

pub(crate) fn downcast_value<T>(key: &TypeKey, erased: ErasedValue) -> DIResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    erased
        .downcast::<Arc<T>>()
        .map(|boxed| *boxed)
        .map_err(|_| DIError::mismatch(key, ERASED_PAYLOAD_MISMATCH))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Resolver, который умеет отдавать только одно значение
    struct SingleValue {
        key: TypeKey,
        value: Arc<String>,
    }

    impl Resolver for SingleValue {
        fn resolve_key(&self, key: &TypeKey) -> DIResult<ErasedValue> {
            if *key == self.key {
                Ok(Box::new(self.value.clone()))
            } else {
                Err(DIError::not_found(key, "single"))
            }
        }
    }

    /// Resolver, который отдает значение не того типа
    struct Liar;

    impl Resolver for Liar {
        fn resolve_key(&self, _key: &TypeKey) -> DIResult<ErasedValue> {
            Ok(Box::new(Arc::new(7_u32)))
        }
    }

    #[test]
    fn test_typed_resolution_through_trait_object() {
        let value = Arc::new("hello".to_string());
        let single = SingleValue {
            key: TypeKey::named::<String>("greeting"),
            value: value.clone(),
        };
        let resolver: &dyn Resolver = &single;

        let resolved = resolver.resolve_named::<String>("greeting");
        assert!(Arc::ptr_eq(&resolved, &value));

        let missing = resolver.try_resolve::<String>();
        assert!(matches!(missing, Err(DIError::ProviderNotFound { .. })));
    }

    #[test]
    fn test_wrong_payload_is_type_mismatch() {
        let resolver: &dyn Resolver = &Liar;

        let error = resolver.try_resolve::<String>().expect_err("u32 is not String");
        assert!(matches!(error, DIError::TypeMismatch { .. }));
        let message = error.to_string();
        assert!(message.contains("not Arc<requested>"));
        assert!(!message.contains("<unknown>"));
    }

    #[test]
    #[should_panic(expected = "Type mismatch")]
    fn test_resolve_panics_on_mismatch() {
        let resolver: &dyn Resolver = &Liar;
        let _ = resolver.resolve::<String>();
    }
}
