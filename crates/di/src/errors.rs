//! Ошибки разрешения зависимостей
//!
//! Регистрация не может завершиться ошибкой (перезапись всегда успешна),
//! поэтому весь error surface - это два случая при resolve:
//!
//! - **ProviderNotFound**: для ключа нет ни одного provider'а
//! - **TypeMismatch**: provider найден, но производит значение другого типа
//!
//! `Container::resolve` считает оба случая ошибкой конфигурации и
//! останавливает операцию через panic. `try_resolve` возвращает
//! те же ошибки как `DIResult<T>` для кода, который проверяет наличие
//! зависимости заранее.

use thiserror::Error;

use crate::key::TypeKey;

/// Ошибка разрешения зависимости
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DIError {
    /// Для ключа не зарегистрирован provider
    #[error("No provider registered for {key} in container '{container}'")]
    ProviderNotFound { key: String, container: String },

    /// Provider производит значение другого типа
    #[error("Type mismatch for {key}: requested {requested}, provider produces {provided}")]
    TypeMismatch {
        key: String,
        requested: &'static str,
        provided: &'static str,
    },
}

impl DIError {
    pub(crate) fn not_found(key: &TypeKey, container: &str) -> Self {
        Self::ProviderNotFound {
            key: key.to_string(),
            container: container.to_string(),
        }
    }

    pub(crate) fn mismatch(key: &TypeKey, provided: &'static str) -> Self {
        Self::TypeMismatch {
            key: key.to_string(),
            requested: key.type_name(),
            provided,
        }
    }

    /// Ключ, на котором произошла ошибка (в форме `Display` от `TypeKey`)
    pub fn key(&self) -> &str {
        match self {
            Self::ProviderNotFound { key, .. } | Self::TypeMismatch { key, .. } => key,
        }
    }
}

/// Result alias для операций resolve
pub type DIResult<T> = Result<T, DIError>;

/// Останавливает операцию с ошибкой конфигурации.
///
/// Отсутствующая или несовместимая зависимость никогда не подменяется
/// значением по умолчанию.
#[track_caller]
pub(crate) fn fatal(error: DIError) -> ! {
    tracing::error!(key = %error.key(), "❌ Dependency resolution failed: {}", error);
    panic!("{}", error)
}
