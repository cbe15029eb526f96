//! Provider с кэшем, ограниченным по времени
//!
//! Пример пользовательской стратегии поверх `Provider`: значение живет
//! `ttl`, после чего factory вызывается заново.

use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::debug;

use crate::{
    provider::{FactoryFn, Provider},
    resolver::Resolver,
};

pub struct ExpiringFactory<T: ?Sized> {
    ttl: Duration,
    cached: Option<(Arc<T>, Instant)>,
    factory: FactoryFn<T>,
}

impl<T: ?Sized> ExpiringFactory<T> {
    pub fn new<F>(ttl: Duration, factory: F) -> Self
    where
        F: Fn(&dyn Resolver) -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            ttl,
            cached: None,
            factory: Box::new(factory),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Есть ли в кэше значение, которое еще не истекло
    pub fn is_fresh(&self) -> bool {
        self.cached
            .as_ref()
            .is_some_and(|(_, built_at)| built_at.elapsed() < self.ttl)
    }
}

impl<T: ?Sized + Send + Sync + 'static> Provider for ExpiringFactory<T> {
    type Value = T;

    fn provide(&mut self, resolver: &dyn Resolver) -> Arc<T> {
        if let Some((value, built_at)) = &self.cached {
            if built_at.elapsed() < self.ttl {
                return value.clone();
            }
            debug!(
                "⏱️ Cached {} expired after {:?}, rebuilding",
                std::any::type_name::<T>(),
                self.ttl
            );
        }

        let value = (self.factory)(resolver);
        self.cached = Some((value.clone(), Instant::now()));
        value
    }
}

impl<T: ?Sized> fmt::Debug for ExpiringFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringFactory")
            .field("value_type", &std::any::type_name::<T>())
            .field("ttl", &self.ttl)
            .field("fresh", &self.is_fresh())
            .finish()
    }
}
