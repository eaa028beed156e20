//! Subscription lifecycle for reactive bindings
//!
//! A [`Binding`] owns at most one [`ListenerRegistration`] at a time. Each
//! refresh removes the active registration, resolves the source again and
//! either subscribes to the new target or falls back to the default value.
//! Source changes never refresh inline: they queue one job per binding on the
//! [`Scheduler`], so a burst of changes costs a single resubscription at the
//! next flush.

use super::data::BoundData;
use super::options::BindOptions;
use super::source::ReferenceSource;
use crate::error::Result;
use crate::firestore::listener::{listen, SnapshotCallback};
use crate::error::FirestoreError;
use crate::firestore::{DocumentSnapshot, ListenerRegistration, QuerySnapshot, SnapshotStore, Target};
use crate::reactive::{Job, JobId, ListenerGuard, ReadSignal, Scheduler, Signal};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

type FirestoreResult<T> = std::result::Result<T, FirestoreError>;

/// Creates bindings against one store and one scheduler
///
/// # Example
/// ```
/// use reactive_firestore::firestore::{CollectionReference, MemoryStore};
/// use reactive_firestore::reactive::{Scheduler, Signal};
/// use reactive_firestore::{Binder, BoundData};
/// use serde_json::json;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let scheduler = Scheduler::new();
/// let binder = Binder::new(store.clone(), scheduler.clone());
///
/// let posts = CollectionReference::new("posts")?;
/// store.set(&posts.doc("hello")?, json!({"title": "Hello"}))?;
///
/// let selected = Signal::new(Some(posts.clone()));
/// let binding = binder.bind(selected.clone(), BoundData::default())?;
/// assert_eq!(binding.get().to_value(), json!([{"title": "Hello", "id": "hello"}]));
///
/// selected.set(None);
/// scheduler.flush()?;
/// assert_eq!(binding.get(), BoundData::Empty);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Binder {
    store: Rc<dyn SnapshotStore>,
    scheduler: Scheduler,
}

impl Binder {
    /// Create a binder over `store`, deferring refreshes to `scheduler`
    pub fn new(store: impl SnapshotStore + 'static, scheduler: Scheduler) -> Self {
        Self {
            store: Rc::new(store),
            scheduler,
        }
    }

    /// Scheduler used for deferred refreshes
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Bind `source` with default options
    ///
    /// # Errors
    /// Resolution errors (malformed references) and synchronous subscribe
    /// errors are returned as-is; no binding is created.
    pub fn bind(&self, source: impl Into<ReferenceSource>, default: BoundData) -> Result<Binding> {
        self.bind_with_options(source, default, BindOptions::default())
    }

    /// Bind `source` with explicit options
    ///
    /// # Errors
    /// Same as [`Binder::bind`].
    pub fn bind_with_options(
        &self,
        source: impl Into<ReferenceSource>,
        default: BoundData,
        options: BindOptions,
    ) -> Result<Binding> {
        let inner = Rc::new(BindingInner {
            store: Rc::clone(&self.store),
            scheduler: self.scheduler.clone(),
            job_id: self.scheduler.next_job_id(),
            source: source.into(),
            output: Signal::new(default.clone()),
            default,
            options,
            registration: RefCell::new(None),
            target: RefCell::new(None),
            generation: Cell::new(0),
            delivered: Cell::new(false),
            disposed: Cell::new(false),
            source_guard: RefCell::new(None),
        });

        // Dropping `binding` on error disposes whatever was set up
        let binding = Binding { inner };
        binding.inner.refresh()?;
        binding.inner.watch_source();
        Ok(binding)
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

struct BindingInner {
    store: Rc<dyn SnapshotStore>,
    scheduler: Scheduler,
    job_id: JobId,
    source: ReferenceSource,
    default: BoundData,
    options: BindOptions,
    output: Signal<BoundData>,
    registration: RefCell<Option<ListenerRegistration>>,
    target: RefCell<Option<Target>>,
    /// Bumped on every refresh and on disposal; callbacks carry the value
    /// they were created with and are ignored once it is outdated
    generation: Cell<u64>,
    delivered: Cell<bool>,
    disposed: Cell<bool>,
    source_guard: RefCell<Option<ListenerGuard>>,
}

impl BindingInner {
    fn watch_source(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let job: Job = Rc::new(move || match weak.upgrade() {
            Some(inner) => inner.refresh(),
            None => Ok(()),
        });
        let scheduler = self.scheduler.clone();
        let job_id = self.job_id;
        let guard = self.source.observe(Rc::new(move || {
            trace!(?job_id, "reference source changed");
            scheduler.schedule(job_id, Rc::clone(&job));
        }));
        *self.source_guard.borrow_mut() = guard;
    }

    /// Unsubscribe, resolve, subscribe: the whole lifecycle step
    fn refresh(self: &Rc<Self>) -> Result<()> {
        if self.disposed.get() {
            return Ok(());
        }
        self.release();

        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.delivered.set(false);

        let target = match self.source.resolve() {
            Ok(Some(target)) => target,
            Ok(None) => {
                debug!("reference absent; using default value");
                self.output.set(self.default.clone());
                return Ok(());
            }
            Err(err) => {
                self.output.set(self.default.clone());
                return Err(err.into());
            }
        };

        debug!(%target, generation, "subscribing");
        let registration = match listen(&*self.store, &target, self.callback_for(&target, generation)) {
            Ok(registration) => registration,
            Err(err) => {
                if self.generation.get() == generation {
                    self.generation.set(generation + 1);
                    self.output.set(self.default.clone());
                }
                return Err(err.into());
            }
        };

        // A snapshot delivered inside `listen` may have run observers that
        // refreshed, disposed or terminated this binding
        if self.generation.get() != generation {
            debug!(%target, generation, "subscription replaced before it was stored");
            registration.remove();
            return Ok(());
        }
        *self.registration.borrow_mut() = Some(registration);
        *self.target.borrow_mut() = Some(target);

        if !self.delivered.get() {
            trace!(generation, "no snapshot yet; showing default value");
            self.output.set(self.default.clone());
        }
        Ok(())
    }

    fn callback_for(self: &Rc<Self>, target: &Target, generation: u64) -> SnapshotCallback {
        let weak = Rc::downgrade(self);
        match target {
            Target::Document(_) => SnapshotCallback::Document(Rc::new(move |result: FirestoreResult<DocumentSnapshot>| {
                if let Some(inner) = current(&weak, generation) {
                    match result {
                        Ok(snapshot) => inner.apply(BoundData::from_document(&snapshot)),
                        Err(err) => inner.terminate(&err),
                    }
                }
            })),
            Target::Query(_) => SnapshotCallback::Query(Rc::new(move |result: FirestoreResult<QuerySnapshot>| {
                if let Some(inner) = current(&weak, generation) {
                    match result {
                        Ok(snapshot) => inner.apply(BoundData::from_query(&snapshot)),
                        Err(err) => inner.terminate(&err),
                    }
                }
            })),
        }
    }

    fn apply(&self, data: BoundData) {
        trace!(generation = self.generation.get(), "snapshot received");
        self.delivered.set(true);
        self.output.set(data);
    }

    /// The store ended the listener with `error`; no further snapshots arrive
    fn terminate(&self, error: &FirestoreError) {
        self.generation.set(self.generation.get() + 1);
        self.release();
        if !self.delivered.get() {
            self.output.set_if_changed(self.default.clone());
        }
        debug!(%error, "listener terminated by the store");
        self.options.handle_error(error);
    }

    /// Remove the active registration, if any
    fn release(&self) {
        let registration = self.registration.borrow_mut().take();
        let target = self.target.borrow_mut().take();
        if let Some(registration) = registration {
            debug!(target = ?target.as_ref().map(Target::path), "unsubscribing");
            registration.remove();
        }
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let guard = self.source_guard.borrow_mut().take();
        drop(guard);
        self.scheduler.cancel(self.job_id);
        self.generation.set(self.generation.get() + 1);
        self.release();
        debug!(job_id = ?self.job_id, "binding disposed");
    }
}

/// Upgrade `weak` if the callback's generation is still the active one
fn current(weak: &Weak<BindingInner>, generation: u64) -> Option<Rc<BindingInner>> {
    let inner = weak.upgrade()?;
    if inner.disposed.get() || inner.generation.get() != generation {
        trace!(generation, "ignoring snapshot from a replaced subscription");
        return None;
    }
    Some(inner)
}

/// Live projection of a document or query into a reactive value
///
/// The output container keeps its identity for the binding's whole life.
/// Dropping the binding disposes it.
pub struct Binding {
    inner: Rc<BindingInner>,
}

impl Binding {
    /// Read-only view of the bound value
    pub fn value(&self) -> ReadSignal<BoundData> {
        self.inner.output.read_only()
    }

    /// Clone the current value
    pub fn get(&self) -> BoundData {
        self.inner.output.get()
    }

    /// Use the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&BoundData) -> R) -> R {
        self.inner.output.with(f)
    }

    /// Value used while no target is active
    pub fn default_value(&self) -> &BoundData {
        &self.inner.default
    }

    /// Target of the active subscription
    pub fn target(&self) -> Option<Target> {
        self.inner.target.borrow().clone()
    }

    /// Whether a subscription is currently active
    ///
    /// Becomes `false` when the store terminates the listener with an error;
    /// the next source change or [`Binding::refresh`] subscribes again.
    pub fn is_subscribed(&self) -> bool {
        self.inner.registration.borrow().is_some()
    }

    /// Whether the active subscription has not delivered a snapshot yet
    pub fn is_pending(&self) -> bool {
        self.is_subscribed() && !self.inner.delivered.get()
    }

    /// Whether [`Binding::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Resubscribe immediately instead of waiting for a source change
    ///
    /// Does nothing once disposed.
    ///
    /// # Errors
    /// Same as [`Binder::bind`].
    pub fn refresh(&self) -> Result<()> {
        self.inner.scheduler.cancel(self.inner.job_id);
        self.inner.refresh()
    }

    /// Stop observing the source and remove the active subscription
    ///
    /// Idempotent. The bound value keeps its last state.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("target", &self.target())
            .field("subscribed", &self.is_subscribed())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::{CollectionReference, DeliveryMode, DocumentReference, MemoryStore};
    use serde_json::json;

    fn setup() -> (MemoryStore, Scheduler, Binder) {
        let store = MemoryStore::new();
        let scheduler = Scheduler::new();
        let binder = Binder::new(store.clone(), scheduler.clone());
        (store, scheduler, binder)
    }

    #[test]
    fn test_document_binding_follows_writes() {
        let (store, _, binder) = setup();
        let alice = DocumentReference::new("users/alice").unwrap();
        let binding = binder.bind(alice.clone(), BoundData::default()).unwrap();
        assert_eq!(binding.get(), BoundData::Document(None));

        store.set(&alice, json!({"name": "Alice"})).unwrap();
        assert_eq!(binding.get().to_value(), json!({"name": "Alice", "id": "alice"}));

        store.delete(&alice).unwrap();
        assert_eq!(binding.get(), BoundData::Document(None));
    }

    #[test]
    fn test_value_identity_is_stable() {
        let (store, scheduler, binder) = setup();
        let reference = Signal::new(Some(CollectionReference::new("a").unwrap()));
        let binding = binder.bind(reference.clone(), BoundData::default()).unwrap();
        let before = binding.value();

        store.set(&DocumentReference::new("a/1").unwrap(), json!({})).unwrap();
        reference.set(Some(CollectionReference::new("b").unwrap()));
        scheduler.flush().unwrap();

        assert!(before.ptr_eq(&binding.value()));
    }

    #[test]
    fn test_drop_disposes() {
        let (store, _, binder) = setup();
        let binding = binder.bind(CollectionReference::new("users").unwrap(), BoundData::default()).unwrap();
        assert_eq!(store.stats().active, 1);
        drop(binding);
        assert_eq!(store.stats().active, 0);
        assert_eq!(store.stats().unsubscribed, 1);
    }

    #[test]
    fn test_refresh_resubscribes_static_source() {
        let (store, _, binder) = setup();
        let binding = binder.bind(CollectionReference::new("users").unwrap(), BoundData::default()).unwrap();
        binding.refresh().unwrap();
        assert_eq!(store.stats().subscribed, 2);
        assert_eq!(store.stats().unsubscribed, 1);
        assert_eq!(store.stats().active, 1);
    }

    #[test]
    fn test_pending_until_first_snapshot() {
        let store = MemoryStore::with_delivery(DeliveryMode::Deferred);
        let binder = Binder::new(store.clone(), Scheduler::new());
        let default = BoundData::collection([]);
        let binding = binder.bind(CollectionReference::new("users").unwrap(), default.clone()).unwrap();

        assert!(binding.is_pending());
        assert_eq!(binding.get(), default);

        store.deliver_pending();
        assert!(!binding.is_pending());
        assert_eq!(binding.get(), BoundData::Collection(vec![]));
    }
}
