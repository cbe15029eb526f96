//! Потокобезопасное хранилище provider'ов
//!
//! RwLock защищает только структуру map (вставка/замена записи).
//! Lock держится на время lookup'а или вставки и отпускается до вызова
//! `provide`, поэтому рекурсивное разрешение не блокируется на store.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::{key::TypeKey, provider::SharedProvider};

#[derive(Default)]
pub(crate) struct ProviderStore {
    entries: RwLock<HashMap<TypeKey, SharedProvider>>,
}

impl ProviderStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Найти provider. Возвращает клон `Arc`, lock уже отпущен.
    pub(crate) fn get(&self, key: &TypeKey) -> Option<SharedProvider> {
        self.entries.read().get(key).cloned()
    }

    /// Вставить или заменить provider. Возвращает замененную запись.
    pub(crate) fn set(&self, key: TypeKey, provider: SharedProvider) -> Option<SharedProvider> {
        self.entries.write().insert(key, provider)
    }

    pub(crate) fn contains(&self, key: &TypeKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub(crate) fn keys(&self) -> Vec<TypeKey> {
        self.entries.read().keys().cloned().collect()
    }
}
