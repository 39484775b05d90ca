//! Running animations and the registry that owns them
//!
//! Each animation is owned by exactly one place, its animator's registry.
//! The scheduler only holds a weak per-tick listener, and handles given to
//! user code are weak too, so deregistering an animation is all it takes to
//! retire it (and release its target).

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use cadence_core::{Callback, CallbackResult, SchedulerHandle};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::tween::TweenFn;
use crate::value::AttrValue;

new_key_type! {
    /// Identity of an animation within its animator
    pub struct AnimationId;
}

/// Identity of an animated target: the address of its `Rc` allocation
///
/// Stable for as long as an animation keeps the target alive.
pub(crate) type TargetKey = usize;

pub(crate) type Finisher = Box<dyn FnOnce()>;

/// One attribute being driven from `start` to `end`
pub(crate) struct Track {
    pub(crate) name: String,
    start: AttrValue,
    end: AttrValue,
    write: Box<dyn Fn(&AttrValue)>,
}

impl Track {
    pub(crate) fn new(
        name: String,
        start: AttrValue,
        end: AttrValue,
        write: Box<dyn Fn(&AttrValue)>,
    ) -> Self {
        Self {
            name,
            start,
            end,
            write,
        }
    }

    fn apply(&self, eased: f64) {
        (self.write)(&self.start.lerp(&self.end, eased));
    }

    /// Write the exact end value
    fn finish(&self) {
        (self.write)(&self.end);
    }
}

/// Mutable part of an animation
struct AnimationState {
    tracks: SmallVec<[Track; 2]>,
    elapsed: f64,
    duration: f64,
    tween: TweenFn,
    on_finished: Option<Finisher>,
    running: bool,
}

/// Parameters of a new animation, validated by the builder
pub(crate) struct AnimationParams {
    pub(crate) target: TargetKey,
    pub(crate) tracks: SmallVec<[Track; 2]>,
    pub(crate) duration: f64,
    pub(crate) tween: TweenFn,
    pub(crate) on_finished: Option<Finisher>,
}

pub(crate) struct Animation {
    id: AnimationId,
    target: TargetKey,
    state: RefCell<AnimationState>,
    listener: Callback,
    registry: Weak<RefCell<Registry>>,
    scheduler: SchedulerHandle,
}

impl Animation {
    fn new(
        id: AnimationId,
        this: &Weak<Animation>,
        params: AnimationParams,
        registry: Weak<RefCell<Registry>>,
        scheduler: SchedulerHandle,
    ) -> Self {
        Self {
            id,
            target: params.target,
            state: RefCell::new(AnimationState {
                tracks: params.tracks,
                elapsed: 0.0,
                duration: params.duration,
                tween: params.tween,
                on_finished: params.on_finished,
                running: true,
            }),
            listener: Callback::bound_weak(this.clone(), |animation: &Animation, dt| {
                animation.advance(dt)
            }),
            registry,
            scheduler,
        }
    }

    pub(crate) fn listener(&self) -> &Callback {
        &self.listener
    }

    /// Per-tick update
    fn advance(&self, dt: f64) -> CallbackResult {
        let mut state = self.state.borrow_mut();
        if !state.running {
            return Ok(());
        }

        state.elapsed += dt;
        let progress = if state.duration <= 0.0 {
            1.0
        } else {
            (state.elapsed / state.duration).min(1.0)
        };

        if progress < 1.0 {
            let eased = (state.tween)(progress);
            for track in &state.tracks {
                track.apply(eased);
            }
            return Ok(());
        }

        for track in &state.tracks {
            track.finish();
        }
        state.running = false;
        let on_finished = state.on_finished.take();
        let tracks = std::mem::take(&mut state.tracks);
        let elapsed = state.elapsed;
        drop(state);

        self.detach(&tracks);
        drop(tracks);
        tracing::debug!(animation = ?self.id, elapsed, "animation finished");

        if let Some(on_finished) = on_finished {
            on_finished();
        }
        Ok(())
    }

    /// Stop driving every attribute; returns `false` if already stopped
    ///
    /// `on_finished` is dropped without being called.
    pub(crate) fn stop(&self, complete: bool) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.running {
            return false;
        }
        state.running = false;
        let on_finished = state.on_finished.take();
        let tracks = std::mem::take(&mut state.tracks);
        drop(state);

        if complete {
            for track in &tracks {
                track.finish();
            }
        }
        self.detach(&tracks);
        tracing::debug!(animation = ?self.id, complete, "animation stopped");

        drop(tracks);
        drop(on_finished);
        true
    }

    /// Stop driving `attribute`; returns `true` if nothing is left to drive
    pub(crate) fn revoke(&self, attribute: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let index = state.tracks.iter().position(|track| track.name == attribute);
        let revoked = index.map(|index| state.tracks.remove(index));
        let empty = state.tracks.is_empty();
        drop(state);

        if revoked.is_some() {
            tracing::debug!(animation = ?self.id, attribute, "attribute revoked");
        }
        empty
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    pub(crate) fn elapsed(&self) -> f64 {
        self.state.borrow().elapsed
    }

    pub(crate) fn attributes(&self) -> Vec<String> {
        self.state
            .borrow()
            .tracks
            .iter()
            .map(|track| track.name.clone())
            .collect()
    }

    /// Leave the scheduler and the registry
    fn detach(&self, tracks: &[Track]) {
        self.scheduler.unschedule(&self.listener);
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let released = registry.borrow_mut().release(self.id, self.target, tracks);
        drop(released);
    }
}

/// Live animations of one animator, and which of them drives which attribute
///
/// Each `(target, attribute)` pair is claimed by at most one animation.
#[derive(Default)]
pub(crate) struct Registry {
    animations: SlotMap<AnimationId, Rc<Animation>>,
    claims: FxHashMap<(TargetKey, String), AnimationId>,
}

impl Registry {
    /// Insert a new animation and claim its attributes
    ///
    /// The caller must have revoked every conflicting claim first.
    pub(crate) fn insert(
        this: &Rc<RefCell<Registry>>,
        params: AnimationParams,
        scheduler: SchedulerHandle,
    ) -> Rc<Animation> {
        let weak_registry = Rc::downgrade(this);
        let mut registry = this.borrow_mut();
        let target = params.target;
        let names: SmallVec<[String; 2]> =
            params.tracks.iter().map(|track| track.name.clone()).collect();

        let id = registry.animations.insert_with_key(|id| {
            Rc::new_cyclic(|weak| Animation::new(id, weak, params, weak_registry, scheduler))
        });
        for name in names {
            registry.claims.insert((target, name), id);
        }
        let animation = Rc::clone(&registry.animations[id]);
        drop(registry);
        animation
    }

    /// Remove an animation along with its remaining claims
    ///
    /// Returned so the caller can drop it after releasing the registry borrow.
    fn release(
        &mut self,
        id: AnimationId,
        target: TargetKey,
        tracks: &[Track],
    ) -> Option<Rc<Animation>> {
        for track in tracks {
            let key = (target, track.name.clone());
            if self.claims.get(&key) == Some(&id) {
                self.claims.remove(&key);
            }
        }
        self.animations.remove(id)
    }

    /// Live animations already claiming any attribute in `tracks`
    pub(crate) fn conflicts(
        &self,
        target: TargetKey,
        tracks: &[Track],
    ) -> SmallVec<[(Rc<Animation>, String); 2]> {
        tracks
            .iter()
            .filter_map(|track| {
                let id = self.claimant(target, &track.name)?;
                let prior = self.animations.get(id)?;
                Some((Rc::clone(prior), track.name.clone()))
            })
            .collect()
    }

    pub(crate) fn get(&self, id: AnimationId) -> Option<&Rc<Animation>> {
        self.animations.get(id)
    }

    pub(crate) fn claimant(&self, target: TargetKey, attribute: &str) -> Option<AnimationId> {
        self.claims.get(&(target, attribute.to_string())).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.animations.len()
    }
}

/// Weak handle to a started animation
///
/// Outliving the animation is fine: once it has finished or been stopped,
/// [`running`](Self::running) is `false` and [`stop`](Self::stop) does
/// nothing.
#[derive(Clone)]
pub struct AnimationHandle {
    id: AnimationId,
    inner: Weak<Animation>,
}

impl AnimationHandle {
    pub(crate) fn new(animation: &Rc<Animation>) -> Self {
        Self {
            id: animation.id,
            inner: Rc::downgrade(animation),
        }
    }

    pub fn id(&self) -> AnimationId {
        self.id
    }

    /// True from start until natural completion or [`stop`](Self::stop)
    pub fn running(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|animation| animation.is_running())
    }

    /// Stop the animation, snapping the attributes it still drives to their
    /// end values when `complete` is set
    ///
    /// `on_finished` is never called for a stopped animation. Returns `false`
    /// if the animation had already finished or been stopped.
    pub fn stop(&self, complete: bool) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|animation| animation.stop(complete))
    }

    /// Attributes this animation still drives
    pub fn attributes(&self) -> Vec<String> {
        self.inner
            .upgrade()
            .map(|animation| animation.attributes())
            .unwrap_or_default()
    }

    /// Seconds since the animation started, while it is live
    pub fn elapsed(&self) -> Option<f64> {
        self.inner.upgrade().map(|animation| animation.elapsed())
    }
}

impl fmt::Debug for AnimationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationHandle")
            .field("id", &self.id)
            .field("running", &self.running())
            .finish()
    }
}
