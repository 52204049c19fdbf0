//! Dependency resolution for scenario evaluation.
//!
//! The engine never constructs dependencies itself. It asks a [`Resolver`]
//! for them by type. [`RequestScope`] is the resolver built for one request:
//! values are stored one per concrete type, keyed by `TypeId`, in
//! `Arc<dyn Any + Send + Sync>` so singletons can be shared across scopes
//! cheaply. [`MockRegistry`] is populated at startup and produces a fresh
//! scope for each request.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use crate::{
    error::{Result, ScenarioError},
    mock::{DescriptionRegistry, Member, SmartMock},
    request::{Request, RequestContext},
};

/// Source of dependencies for one execution context.
pub trait Resolver: Send + Sync {
    /// Look up the value registered for `id`.
    fn resolve_any(&self, id: TypeId) -> Option<&(dyn Any + Send + Sync)>;
}

/// Typed lookup helpers available on every [`Resolver`].
pub trait ResolverExt: Resolver {
    /// Resolve the value of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::DependencyNotRegistered`] naming `T` when
    /// the resolver holds no such value.
    fn resolve<T: Send + Sync + 'static>(&self) -> Result<&T> {
        self.resolve_any(TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
            .ok_or(ScenarioError::DependencyNotRegistered(
                std::any::type_name::<T>(),
            ))
    }

    /// Resolve the mock standing in for capability `C`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::DependencyNotRegistered`] naming
    /// `SmartMock<C>` when no mock for `C` is registered.
    fn mock<C: ?Sized + 'static>(&self) -> Result<&SmartMock<C>> { self.resolve::<SmartMock<C>>() }
}

impl<R: Resolver + ?Sized> ResolverExt for R {}

/// Dependencies visible to one request.
///
/// ```
/// use smartmocks::scope::{RequestScope, ResolverExt};
///
/// let mut scope = RequestScope::default();
/// scope.insert(42u32);
/// assert_eq!(*scope.resolve::<u32>().expect("u32 should resolve"), 42);
/// assert!(scope.resolve::<String>().is_err());
/// ```
#[derive(Clone, Default)]
pub struct RequestScope {
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl RequestScope {
    /// Insert a value of type `T`, replacing any existing one.
    pub fn insert<T>(&mut self, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.insert_shared(Arc::new(value));
    }

    /// Insert an already shared value of type `T`.
    pub fn insert_shared<T>(&mut self, value: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        self.values
            .insert(TypeId::of::<T>(), value as Arc<dyn Any + Send + Sync>);
    }

    /// Number of registered values.
    #[must_use]
    pub fn len(&self) -> usize { self.values.len() }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}

impl Resolver for RequestScope {
    fn resolve_any(&self, id: TypeId) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get(&id).map(|value| &**value)
    }
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScope")
            .field("values", &self.values.len())
            .finish()
    }
}

type ScopedFactory = Box<dyn Fn(&Request, &Arc<DescriptionRegistry>, &mut RequestScope) + Send + Sync>;
type SingletonFactory = Box<dyn FnOnce(&Arc<DescriptionRegistry>, &mut RequestScope) + Send>;

/// Startup-time registry that builds a [`RequestScope`] per request.
///
/// ```
/// use smartmocks::{
///     mock::Member,
///     request::Request,
///     scope::{MockRegistry, ResolverExt},
/// };
///
/// struct AuthenticationService;
/// const AUTHENTICATED: Member<AuthenticationService, bool> = Member::new("authenticated");
///
/// let registry = MockRegistry::builder()
///     .scoped_mock::<AuthenticationService, _>(|mock, request| {
///         mock.setup(AUTHENTICATED, request.header("x-auth").is_some());
///     })
///     .build();
///
/// let ctx = registry.context(Request::get("/").with_header("x-auth", "1"));
/// let mock = ctx.resolver().mock::<AuthenticationService>().expect("mock registered");
/// assert_eq!(mock.get(AUTHENTICATED), Some(&true));
/// ```
pub struct MockRegistry {
    descriptions: Arc<DescriptionRegistry>,
    singletons: RequestScope,
    scoped: Vec<ScopedFactory>,
}

impl MockRegistry {
    /// Start configuring a registry.
    #[must_use]
    pub fn builder() -> MockRegistryBuilder { MockRegistryBuilder::default() }

    /// Shared description registry.
    #[must_use]
    pub fn descriptions(&self) -> &Arc<DescriptionRegistry> { &self.descriptions }

    /// Build a fresh scope for `request`.
    ///
    /// Singletons are shared with every other scope; each scoped mock is
    /// created and configured anew.
    #[must_use]
    pub fn scope(&self, request: &Request) -> RequestScope {
        let mut scope = self.singletons.clone();
        for factory in &self.scoped {
            factory(request, &self.descriptions, &mut scope);
        }
        scope
    }

    /// Build a scope for `request` and pair the two.
    #[must_use]
    pub fn context(&self, request: Request) -> RequestContext {
        let scope = self.scope(&request);
        RequestContext::new(request, scope)
    }
}

impl fmt::Debug for MockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRegistry")
            .field("descriptions", &self.descriptions)
            .field("singletons", &self.singletons)
            .field("scoped", &self.scoped.len())
            .finish()
    }
}

/// Builder for [`MockRegistry`].
#[derive(Default)]
pub struct MockRegistryBuilder {
    descriptions: DescriptionRegistry,
    singletons: Vec<SingletonFactory>,
    scoped: Vec<ScopedFactory>,
}

impl MockRegistryBuilder {
    /// Register a shared description for `member`.
    #[must_use]
    pub fn describe<C, V, F>(mut self, member: Member<C, V>, describe: F) -> Self
    where
        C: ?Sized + 'static,
        V: 'static,
        F: Fn(&V) -> String + Send + Sync + 'static,
    {
        self.descriptions.describe(member, describe);
        self
    }

    /// Register a mock for `C` created anew for every request.
    ///
    /// `configure` runs once per scope with the request being served, so
    /// property values may depend on headers or the path.
    #[must_use]
    pub fn scoped_mock<C, F>(mut self, configure: F) -> Self
    where
        C: ?Sized + 'static,
        F: Fn(&mut SmartMock<C>, &Request) + Send + Sync + 'static,
    {
        self.scoped.push(Box::new(move |request, descriptions, scope| {
            let mut mock = SmartMock::<C>::new(Arc::clone(descriptions));
            configure(&mut mock, request);
            scope.insert(mock);
        }));
        self
    }

    /// Register one mock for `C` shared by every request.
    #[must_use]
    pub fn singleton_mock<C, F>(mut self, configure: F) -> Self
    where
        C: ?Sized + 'static,
        F: FnOnce(&mut SmartMock<C>) + Send + 'static,
    {
        self.singletons.push(Box::new(move |descriptions, scope| {
            let mut mock = SmartMock::<C>::new(Arc::clone(descriptions));
            configure(&mut mock);
            scope.insert(mock);
        }));
        self
    }

    /// Register a plain value shared by every request.
    #[must_use]
    pub fn singleton<T>(mut self, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.singletons
            .push(Box::new(move |_, scope| scope.insert(value)));
        self
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> MockRegistry {
        let descriptions = Arc::new(self.descriptions);
        let mut singletons = RequestScope::default();
        for factory in self.singletons {
            factory(&descriptions, &mut singletons);
        }
        tracing::debug!(
            descriptions = descriptions.len(),
            singletons = singletons.len(),
            scoped = self.scoped.len(),
            "mock registry built"
        );
        MockRegistry {
            descriptions,
            singletons,
            scoped: self.scoped,
        }
    }
}
