use alloc::{borrow::Cow, string::String};
use core::{
    any::{type_name, TypeId},
    fmt::{self, Display, Formatter},
};

/// Runtime identity of a type.
///
/// Ordered by name first, so listings of type keys come out alphabetical.
/// The id keeps two types with the same printed name apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit_once("::").map_or(self.name, |(_, name)| name)
    }
}

/// Identifier of a requested capability.
///
/// Type keys compare by [`TypeId`], so two keys built from the same type are equal
/// regardless of how the type was spelled. Name keys compare by their string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Type(TypeInfo),
    Name(Cow<'static, str>),
}

impl Key {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self::Type(TypeInfo::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn name(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Name(name.into())
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> Option<&TypeInfo> {
        match self {
            Self::Type(info) => Some(info),
            Self::Name(_) => None,
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(info) => f.write_str(info.name),
            Self::Name(name) => write!(f, "\"{name}\""),
        }
    }
}

impl From<TypeInfo> for Key {
    #[inline]
    fn from(info: TypeInfo) -> Self {
        Self::Type(info)
    }
}

impl From<&'static str> for Key {
    #[inline]
    fn from(name: &'static str) -> Self {
        Self::Name(Cow::Borrowed(name))
    }
}

impl From<String> for Key {
    #[inline]
    fn from(name: String) -> Self {
        Self::Name(Cow::Owned(name))
    }
}

#[cfg(test)]
mod tests {
    use super::{Key, TypeInfo};

    use alloc::{string::ToString as _, sync::Arc};

    trait Capability {}
    struct Impl;

    #[test]
    fn test_type_keys_compare_by_id() {
        assert_eq!(Key::of::<Impl>(), Key::of::<Impl>());
        assert_ne!(Key::of::<Impl>(), Key::of::<dyn Capability>());
        assert_ne!(Key::of::<Impl>(), Key::of::<Arc<Impl>>());
    }

    #[test]
    fn test_name_keys_compare_by_value() {
        assert_eq!(Key::name("db"), Key::from("db".to_string()));
        assert_ne!(Key::name("db"), Key::name("cache"));
        assert_ne!(Key::name("db"), Key::of::<Impl>());
    }

    #[test]
    fn test_type_keys_order_by_name() {
        struct Alpha;
        struct Beta;

        let mut keys = [Key::name("db"), Key::of::<Beta>(), Key::of::<Alpha>()];
        keys.sort();

        assert_eq!(keys, [Key::of::<Alpha>(), Key::of::<Beta>(), Key::name("db")]);
    }

    #[test]
    fn test_short_name() {
        assert_eq!(TypeInfo::of::<Impl>().short_name(), "Impl");
        assert_eq!(Key::name("db").to_string(), "\"db\"");
        assert!(Key::of::<Impl>().to_string().ends_with("Impl"));
    }
}
