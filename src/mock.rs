//! Mock-backed capabilities and their descriptions.
//!
//! A capability is any `'static` type (usually a marker struct or a trait
//! object type) standing in for a dependency interface. Its observable
//! properties are named by [`Member`] handles. Each request scope owns a
//! [`SmartMock`] per capability holding the configured property values, while
//! the human-readable descriptions live in a shared [`DescriptionRegistry`]
//! built once at startup.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    marker::PhantomData,
    sync::Arc,
};

type DescribeFn = Arc<dyn Fn(&dyn Any) -> Option<String> + Send + Sync>;

/// Typed handle naming one observable property of capability `C`.
///
/// Members are plain data and can be declared as constants next to the
/// capability they describe:
///
/// ```
/// use smartmocks::mock::Member;
///
/// pub struct AuthenticationService;
///
/// pub const AUTHENTICATED: Member<AuthenticationService, bool> = Member::new("authenticated");
/// assert_eq!(AUTHENTICATED.name(), "authenticated");
/// ```
pub struct Member<C: ?Sized, V> {
    name: &'static str,
    _marker: PhantomData<fn(&C) -> V>,
}

impl<C: ?Sized, V> Member<C, V> {
    /// Create a handle for the property called `name`.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Name of the property.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }
}

impl<C: ?Sized, V> Clone for Member<C, V> {
    fn clone(&self) -> Self { *self }
}

impl<C: ?Sized, V> Copy for Member<C, V> {}

impl<C: ?Sized, V> fmt::Debug for Member<C, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("capability", &std::any::type_name::<C>())
            .field("name", &self.name)
            .finish()
    }
}

fn erase<V, F>(describe: F) -> DescribeFn
where
    V: 'static,
    F: Fn(&V) -> String + Send + Sync + 'static,
{
    Arc::new(move |value: &dyn Any| value.downcast_ref::<V>().map(&describe))
}

/// Description functions keyed by capability and member name.
///
/// At most one entry exists per key; registering again replaces the earlier
/// function.
#[derive(Clone, Default)]
pub struct DescriptionRegistry {
    entries: HashMap<(TypeId, &'static str), DescribeFn>,
}

impl DescriptionRegistry {
    /// Register `describe` as the description of `member`.
    pub fn describe<C, V, F>(&mut self, member: Member<C, V>, describe: F)
    where
        C: ?Sized + 'static,
        V: 'static,
        F: Fn(&V) -> String + Send + Sync + 'static,
    {
        self.entries
            .insert((TypeId::of::<C>(), member.name()), erase(describe));
    }

    /// Describe `value` for `member`, if a description was registered.
    #[must_use]
    pub fn description_for<C, V>(&self, member: Member<C, V>, value: &V) -> Option<String>
    where
        C: ?Sized + 'static,
        V: 'static,
    {
        self.entries
            .get(&(TypeId::of::<C>(), member.name()))
            .and_then(|describe| describe(value))
    }

    /// Number of registered descriptions.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Returns `true` when no description has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl fmt::Debug for DescriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptionRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Request-scoped double for capability `C`.
///
/// Property values are configured with [`SmartMock::setup`]; a property that
/// was never configured reads as `None` and therefore never satisfies a
/// precondition.
pub struct SmartMock<C: ?Sized + 'static> {
    values: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
    overrides: HashMap<&'static str, DescribeFn>,
    descriptions: Arc<DescriptionRegistry>,
    _capability: PhantomData<fn(&C)>,
}

impl<C: ?Sized + 'static> Default for SmartMock<C> {
    fn default() -> Self { Self::new(Arc::default()) }
}

impl<C: ?Sized + 'static> SmartMock<C> {
    /// Create an unconfigured mock sharing `descriptions`.
    #[must_use]
    pub fn new(descriptions: Arc<DescriptionRegistry>) -> Self {
        Self {
            values: HashMap::new(),
            overrides: HashMap::new(),
            descriptions,
            _capability: PhantomData,
        }
    }

    /// Configure the value returned for `member`.
    pub fn setup<V>(&mut self, member: Member<C, V>, value: V) -> &mut Self
    where
        V: Send + Sync + 'static,
    {
        self.values.insert(member.name(), Box::new(value));
        self
    }

    /// Describe `member` for this mock only, shadowing the shared registry.
    pub fn describe<V, F>(&mut self, member: Member<C, V>, describe: F) -> &mut Self
    where
        V: 'static,
        F: Fn(&V) -> String + Send + Sync + 'static,
    {
        self.overrides.insert(member.name(), erase(describe));
        self
    }

    /// Currently configured value of `member`.
    #[must_use]
    pub fn get<V: 'static>(&self, member: Member<C, V>) -> Option<&V> {
        self.values
            .get(member.name())
            .and_then(|value| value.downcast_ref::<V>())
    }

    /// Human-readable text for `member` holding `value`.
    ///
    /// Falls back to `"<member> is <value:?>"` when neither this mock nor the
    /// shared registry describes the member.
    #[must_use]
    pub fn description_for<V>(&self, member: Member<C, V>, value: &V) -> String
    where
        V: fmt::Debug + 'static,
    {
        self.overrides
            .get(member.name())
            .and_then(|describe| describe(value))
            .or_else(|| self.descriptions.description_for(member, value))
            .unwrap_or_else(|| format!("{} is {value:?}", member.name()))
    }
}

impl<C: ?Sized + 'static> fmt::Debug for SmartMock<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartMock")
            .field("capability", &std::any::type_name::<C>())
            .field("configured", &self.values.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
