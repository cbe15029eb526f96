//! Ключ регистрации: (TypeId запрошенного типа, опциональное имя)

use std::{
    any::TypeId,
    fmt,
    hash::{Hash, Hasher},
};

/// Идентифицирует слот регистрации в контейнере.
///
/// Равенство и hash строятся только по `TypeId` и имени. `type_name`
/// хранится для диагностики. Ключ зависит от объявленного типа
/// (в том числе `dyn Trait`), а не от конкретного типа, которым
/// значение было построено.
#[derive(Clone)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<String>,
}

impl TypeKey {
    /// Ключ для типа без имени
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::with_name::<T>(None)
    }

    /// Ключ для типа с именем. Пустая строка - тоже имя, отличное от `None`.
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::with_name::<T>(Some(name.into()))
    }

    pub(crate) fn with_name<T: ?Sized + 'static>(name: Option<String>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}[{:?}]", self.type_name, name),
            None => f.write_str(self.type_name),
        }
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeKey")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .finish()
    }
}
