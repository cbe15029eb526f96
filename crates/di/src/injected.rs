//! Ленивое внедрение зависимости в поле структуры
//!
//! ```
//! use di::{Container, Injected};
//!
//! struct Clock(u64);
//!
//! struct Scheduler {
//!     clock: Injected<Clock>,
//! }
//!
//! let container = Container::new();
//! container.register_instance(Clock(17));
//!
//! let scheduler = Scheduler {
//!     clock: Injected::in_container(&container),
//! };
//! assert_eq!(scheduler.clock.0, 17);
//! ```

use std::{fmt, ops::Deref, sync::Arc};

use once_cell::sync::OnceCell;

use crate::{
    container::Container,
    errors::{fatal, DIResult},
};

/// Ссылка, которая разрешается из контейнера при первом чтении и
/// кэширует результат на время жизни владельца.
///
/// Кэш - `OnceCell`: конкурентные первые чтения разрешают значение один
/// раз, все читатели получают один и тот же `Arc`. Сброса нет.
pub struct Injected<T: ?Sized> {
    container: Container,
    name: Option<String>,
    cell: OnceCell<Arc<T>>,
}

impl<T> Injected<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    /// Привязка к общему контейнеру, без имени
    pub fn new() -> Self {
        Self::bind(Container::shared().clone(), None)
    }

    /// Привязка к общему контейнеру, с именем
    pub fn named(name: impl Into<String>) -> Self {
        Self::bind(Container::shared().clone(), Some(name.into()))
    }

    pub fn in_container(container: &Container) -> Self {
        Self::bind(container.clone(), None)
    }

    pub fn named_in(container: &Container, name: impl Into<String>) -> Self {
        Self::bind(container.clone(), Some(name.into()))
    }

    fn bind(container: Container, name: Option<String>) -> Self {
        Self {
            container,
            name,
            cell: OnceCell::new(),
        }
    }

    /// Значение: при первом чтении разрешается из контейнера.
    ///
    /// # Panics
    ///
    /// Если зависимость не зарегистрирована в контейнере.
    #[track_caller]
    pub fn get(&self) -> &Arc<T> {
        match self.try_get() {
            Ok(value) => value,
            Err(error) => fatal(error),
        }
    }

    /// Как `get`, но ошибка разрешения возвращается, а кэш остается пустым
    pub fn try_get(&self) -> DIResult<&Arc<T>> {
        self.cell.get_or_try_init(|| match &self.name {
            Some(name) => self.container.try_resolve_named::<T>(name),
            None => self.container.try_resolve::<T>(),
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl<T> Default for Injected<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for Injected<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    type Target = T;

    #[track_caller]
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T: ?Sized> fmt::Debug for Injected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injected")
            .field("value_type", &std::any::type_name::<T>())
            .field("container", &self.container.name())
            .field("name", &self.name)
            .field("resolved", &self.cell.get().is_some())
            .finish()
    }
}
