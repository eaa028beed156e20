//! Where a binding gets its target from
//!
//! A [`ReferenceSource`] resolves to `Option<Target>`: `Some` when a usable
//! reference is present, `None` when it is absent. Reactive sources also
//! report changes so the binding can resubscribe.

use crate::error::FirestoreError;
use crate::firestore::{CollectionReference, DocumentReference, Query, Target};
use crate::reactive::{Derived, Listener, ListenerGuard, Observable, ReadSignal, Signal};
use std::rc::Rc;

/// Values that resolve to an optional listen target
///
/// Construction errors carried in a `Result` surface when the value is
/// resolved.
pub trait IntoTarget {
    /// Resolve into a present or absent target
    fn into_target(self) -> Result<Option<Target>, FirestoreError>;
}

impl IntoTarget for Target {
    fn into_target(self) -> Result<Option<Target>, FirestoreError> {
        Ok(Some(self))
    }
}

impl IntoTarget for DocumentReference {
    fn into_target(self) -> Result<Option<Target>, FirestoreError> {
        Ok(Some(Target::Document(self)))
    }
}

impl IntoTarget for CollectionReference {
    fn into_target(self) -> Result<Option<Target>, FirestoreError> {
        Ok(Some(self.into()))
    }
}

impl IntoTarget for Query {
    fn into_target(self) -> Result<Option<Target>, FirestoreError> {
        Ok(Some(Target::Query(self)))
    }
}

impl<T: IntoTarget> IntoTarget for Option<T> {
    fn into_target(self) -> Result<Option<Target>, FirestoreError> {
        match self {
            Some(value) => value.into_target(),
            None => Ok(None),
        }
    }
}

impl<T: IntoTarget> IntoTarget for Result<T, FirestoreError> {
    fn into_target(self) -> Result<Option<Target>, FirestoreError> {
        self?.into_target()
    }
}

type Resolver = Rc<dyn Fn() -> Result<Option<Target>, FirestoreError>>;

/// Static or reactive origin of a binding's target
///
/// Built through `From`: plain references are static, while [`Signal`],
/// [`ReadSignal`] and [`Derived`] holding any [`IntoTarget`] value are
/// reactive.
#[derive(Clone)]
pub struct ReferenceSource {
    resolver: Resolver,
    observable: Option<Rc<dyn Observable>>,
}

impl ReferenceSource {
    /// Source that never changes
    pub fn constant(value: impl IntoTarget) -> Self {
        let resolved = value.into_target();
        Self {
            resolver: Rc::new(move || resolved.clone()),
            observable: None,
        }
    }

    /// Source resolved by `resolve` and invalidated by `observable`
    pub fn reactive(
        resolve: impl Fn() -> Result<Option<Target>, FirestoreError> + 'static,
        observable: Rc<dyn Observable>,
    ) -> Self {
        Self {
            resolver: Rc::new(resolve),
            observable: Some(observable),
        }
    }

    /// Resolve the current target
    pub fn resolve(&self) -> Result<Option<Target>, FirestoreError> {
        (self.resolver)()
    }

    /// Whether this source can change over time
    pub fn is_reactive(&self) -> bool {
        self.observable.is_some()
    }

    /// Register a change listener; static sources return `None`
    pub fn observe(&self, listener: Listener) -> Option<ListenerGuard> {
        self.observable
            .as_ref()
            .map(|observable| observable.observe(listener))
    }
}

impl std::fmt::Debug for ReferenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceSource")
            .field("reactive", &self.is_reactive())
            .finish_non_exhaustive()
    }
}

impl From<Target> for ReferenceSource {
    fn from(target: Target) -> Self {
        Self::constant(target)
    }
}

impl From<DocumentReference> for ReferenceSource {
    fn from(reference: DocumentReference) -> Self {
        Self::constant(reference)
    }
}

impl From<CollectionReference> for ReferenceSource {
    fn from(collection: CollectionReference) -> Self {
        Self::constant(collection)
    }
}

impl From<Query> for ReferenceSource {
    fn from(query: Query) -> Self {
        Self::constant(query)
    }
}

impl From<Option<Target>> for ReferenceSource {
    fn from(target: Option<Target>) -> Self {
        Self::constant(target)
    }
}

impl<T: IntoTarget + Clone + 'static> From<Signal<T>> for ReferenceSource {
    fn from(signal: Signal<T>) -> Self {
        let reader = signal.clone();
        Self::reactive(move || reader.get().into_target(), Rc::new(signal))
    }
}

impl<T: IntoTarget + Clone + 'static> From<ReadSignal<T>> for ReferenceSource {
    fn from(signal: ReadSignal<T>) -> Self {
        let reader = signal.clone();
        Self::reactive(move || reader.get().into_target(), Rc::new(signal))
    }
}

impl<T: IntoTarget + Clone + 'static> From<Derived<T>> for ReferenceSource {
    fn from(derived: Derived<T>) -> Self {
        let reader = derived.clone();
        Self::reactive(move || reader.get().into_target(), Rc::new(derived))
    }
}
