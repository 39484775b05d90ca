//! Animation engine
//!
//! An [`Animator`] starts animations on a [`Scheduler`] and keeps the
//! registry that makes sure each attribute of each target is driven by at
//! most one animation. Starting an animation on an attribute that is
//! already being animated takes the attribute over: the new animation
//! interpolates from the attribute's current value, and the old one stops
//! driving just that attribute.
//!
//! # Example
//!
//! ```ignore
//! let animator = Animator::new(&scheduler);
//! let handle = animator
//!     .animate(&sprite)
//!     .attr("x", 10.0)
//!     .tween("accel_decel")
//!     .duration(2.0)
//!     .on_finished(|| tracing::info!("arrived"))
//!     .start()?;
//! ```

use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use cadence_core::{Scheduler, SchedulerHandle};
use smallvec::SmallVec;

use crate::animation::{AnimationHandle, AnimationParams, Finisher, Registry, TargetKey, Track};
use crate::config::AnimatorConfig;
use crate::error::AnimationError;
use crate::target::{Accessor, Animatable};
use crate::tween::{TweenFn, TweenRegistry};
use crate::value::AttrValue;

/// Starts and owns attribute animations
///
/// Dropping the animator drops every animation it started; their per-tick
/// listeners go dead and the scheduler prunes them.
pub struct Animator {
    registry: Rc<RefCell<Registry>>,
    scheduler: SchedulerHandle,
    tweens: TweenRegistry,
    config: AnimatorConfig,
}

impl Animator {
    pub fn new(scheduler: &Scheduler) -> Self {
        Self::with_config(scheduler, AnimatorConfig::default())
    }

    pub fn with_config(scheduler: &Scheduler, config: AnimatorConfig) -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry::default())),
            scheduler: scheduler.handle(),
            tweens: TweenRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    pub fn tweens(&self) -> &TweenRegistry {
        &self.tweens
    }

    /// Register custom tweens here
    pub fn tweens_mut(&mut self) -> &mut TweenRegistry {
        &mut self.tweens
    }

    /// Begin describing an animation of `target`
    pub fn animate<T: Animatable>(&self, target: &Rc<RefCell<T>>) -> AnimationBuilder<'_, T> {
        AnimationBuilder {
            animator: self,
            target: Rc::clone(target),
            attrs: SmallVec::new(),
            tween: None,
            duration: None,
            on_finished: None,
        }
    }

    /// Number of live animations
    pub fn len(&self) -> usize {
        self.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The animation currently driving `attribute` of `target`, if any
    pub fn animation_for<T: Animatable>(
        &self,
        target: &Rc<RefCell<T>>,
        attribute: &str,
    ) -> Option<AnimationHandle> {
        let registry = self.registry.borrow();
        let id = registry.claimant(target_key(target), attribute)?;
        registry.get(id).map(AnimationHandle::new)
    }

    /// Take over conflicting claims, then register and schedule `params`
    fn launch(&self, params: AnimationParams) -> AnimationHandle {
        let conflicts = self
            .registry
            .borrow()
            .conflicts(params.target, &params.tracks);
        for (prior, attribute) in &conflicts {
            // A fully revoked animation did not complete, so it is halted
            // without its `on_finished`.
            if prior.revoke(attribute) {
                prior.stop(false);
            }
        }
        drop(conflicts);

        let attributes = params.tracks.len();
        let duration = params.duration;
        let animation = Registry::insert(&self.registry, params, self.scheduler.clone());
        self.scheduler.each_tick(animation.listener());

        let handle = AnimationHandle::new(&animation);
        tracing::debug!(animation = ?handle.id(), attributes, duration, "animation started");
        handle
    }
}

impl fmt::Debug for Animator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animator")
            .field("animations", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

enum TweenChoice {
    Named(String),
    Function(TweenFn),
}

/// Describes an animation before it is started
///
/// Nothing happens until [`start`](Self::start).
#[must_use = "an animation does nothing until `start` is called"]
pub struct AnimationBuilder<'a, T: Animatable> {
    animator: &'a Animator,
    target: Rc<RefCell<T>>,
    attrs: SmallVec<[(String, AttrValue); 2]>,
    tween: Option<TweenChoice>,
    duration: Option<f64>,
    on_finished: Option<Finisher>,
}

impl<'a, T: Animatable> AnimationBuilder<'a, T> {
    /// Animate `attribute` to `end`; naming an attribute twice keeps the
    /// later value
    pub fn attr(mut self, attribute: impl Into<String>, end: impl Into<AttrValue>) -> Self {
        let attribute = attribute.into();
        let end = end.into();
        match self.attrs.iter_mut().find(|(name, _)| *name == attribute) {
            Some((_, value)) => *value = end,
            None => self.attrs.push((attribute, end)),
        }
        self
    }

    /// Use the registered tween called `name`
    pub fn tween(mut self, name: impl Into<String>) -> Self {
        self.tween = Some(TweenChoice::Named(name.into()));
        self
    }

    /// Use `tween` directly, without going through the registry
    pub fn tween_fn(mut self, tween: TweenFn) -> Self {
        self.tween = Some(TweenChoice::Function(tween));
        self
    }

    /// Seconds; zero or less finishes on the first tick
    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Called once on natural completion, never when stopped or revoked
    pub fn on_finished(mut self, on_finished: impl FnOnce() + 'static) -> Self {
        self.on_finished = Some(Box::new(on_finished));
        self
    }

    /// Validate everything, then claim the attributes and start ticking
    ///
    /// On error nothing has been claimed, revoked, or scheduled.
    pub fn start(self) -> Result<AnimationHandle, AnimationError> {
        let animator = self.animator;
        if !animator.scheduler.is_alive() {
            return Err(AnimationError::SchedulerDropped);
        }

        let tween = match self.tween {
            Some(TweenChoice::Function(tween)) => tween,
            Some(TweenChoice::Named(name)) => animator.tweens.resolve(&name)?,
            None => animator.tweens.resolve(&animator.config.default_tween)?,
        };

        let mut tracks = SmallVec::new();
        {
            let target = self.target.borrow();
            for (attribute, end) in self.attrs {
                let Some(accessor) = T::accessor(&attribute) else {
                    return Err(AnimationError::InvalidAttribute {
                        target: type_name::<T>(),
                        attribute,
                    });
                };
                let start = accessor.get(&target);
                if start.shape() != end.shape() {
                    return Err(AnimationError::ShapeMismatch {
                        attribute,
                        expected: start.shape(),
                        found: end.shape(),
                    });
                }
                let write = writer(&self.target, accessor);
                tracks.push(Track::new(attribute, start, end, write));
            }
        }

        Ok(animator.launch(AnimationParams {
            target: target_key(&self.target),
            tracks,
            duration: self.duration.unwrap_or(animator.config.default_duration),
            tween,
            on_finished: self.on_finished,
        }))
    }
}

fn target_key<T>(target: &Rc<RefCell<T>>) -> TargetKey {
    Rc::as_ptr(target) as *const () as usize
}

/// Setter closure that keeps `target` alive while the animation runs
fn writer<T: 'static>(target: &Rc<RefCell<T>>, accessor: Accessor<T>) -> Box<dyn Fn(&AttrValue)> {
    let target = Rc::clone(target);
    Box::new(move |value: &AttrValue| accessor.set(&mut target.borrow_mut(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Sprite {
        x: f64,
        y: f64,
        writes: u32,
    }

    impl Animatable for Sprite {
        fn accessor(attribute: &str) -> Option<Accessor<Self>> {
            match attribute {
                "x" => Some(Accessor::scalar(
                    |s| s.x,
                    |s, v| {
                        s.x = v;
                        s.writes += 1;
                    },
                )),
                "y" => Some(Accessor::scalar(|s| s.y, |s, v| s.y = v)),
                _ => None,
            }
        }
    }

    fn sprite() -> Rc<RefCell<Sprite>> {
        Rc::new(RefCell::new(Sprite::default()))
    }

    #[test]
    fn test_interpolates_and_finishes() {
        let scheduler = Scheduler::new();
        let animator = Animator::new(&scheduler);
        let target = sprite();

        let handle = animator
            .animate(&target)
            .attr("x", 10.0)
            .duration(2.0)
            .start()
            .unwrap();
        assert!(handle.running());
        assert_eq!(animator.len(), 1);

        scheduler.tick(1.0);
        assert_eq!(target.borrow().x, 5.0);
        assert_eq!(handle.elapsed(), Some(1.0));

        scheduler.tick(1.0);
        assert_eq!(target.borrow().x, 10.0);
        assert!(!handle.running());
        assert!(animator.is_empty());
        assert_eq!(scheduler.listener_count(), 0);
    }

    #[test]
    fn test_setter_side_effects_run_every_tick() {
        let scheduler = Scheduler::new();
        let animator = Animator::new(&scheduler);
        let target = sprite();

        animator
            .animate(&target)
            .attr("x", 4.0)
            .duration(1.0)
            .start()
            .unwrap();
        for _ in 0..4 {
            scheduler.tick(0.25);
        }

        assert_eq!(target.borrow().writes, 4);
    }

    #[test]
    fn test_tween_shapes_progress() {
        let scheduler = Scheduler::new();
        let animator = Animator::new(&scheduler);
        let target = sprite();

        animator
            .animate(&target)
            .attr("x", 100.0)
            .tween("accelerate")
            .duration(1.0)
            .start()
            .unwrap();
        scheduler.tick(0.5);

        assert_eq!(target.borrow().x, 25.0);
    }

    #[test]
    fn test_config_defaults_apply() {
        let scheduler = Scheduler::new();
        let animator = Animator::with_config(&scheduler, AnimatorConfig::snappy());
        let target = sprite();

        animator.animate(&target).attr("x", 1.0).start().unwrap();
        scheduler.tick(0.125);
        assert_eq!(target.borrow().x, 0.75);

        scheduler.tick(0.125);
        assert_eq!(target.borrow().x, 1.0);
    }

    #[test]
    fn test_custom_tween_through_registry() {
        fn step(n: f64) -> f64 {
            if n < 0.5 {
                0.0
            } else {
                1.0
            }
        }

        let scheduler = Scheduler::new();
        let mut animator = Animator::new(&scheduler);
        animator.tweens_mut().register("step", step);
        let target = sprite();

        animator
            .animate(&target)
            .attr("x", 8.0)
            .tween("step")
            .duration(1.0)
            .start()
            .unwrap();
        scheduler.tick(0.25);
        assert_eq!(target.borrow().x, 0.0);
        scheduler.tick(0.5);
        assert_eq!(target.borrow().x, 8.0);
    }

    #[test]
    fn test_repeated_attr_keeps_last_value() {
        let scheduler = Scheduler::new();
        let animator = Animator::new(&scheduler);
        let target = sprite();

        let handle = animator
            .animate(&target)
            .attr("x", 1.0)
            .attr("x", 3.0)
            .duration(0.0)
            .start()
            .unwrap();
        assert_eq!(handle.attributes(), vec!["x".to_string()]);

        scheduler.tick(0.0);
        assert_eq!(target.borrow().x, 3.0);
    }

    #[test]
    fn test_animation_for_tracks_claims() {
        let scheduler = Scheduler::new();
        let animator = Animator::new(&scheduler);
        let target = sprite();
        let other = sprite();

        let first = animator
            .animate(&target)
            .attr("x", 1.0)
            .attr("y", 1.0)
            .start()
            .unwrap();
        assert_eq!(animator.animation_for(&target, "x").map(|h| h.id()), Some(first.id()));
        assert!(animator.animation_for(&other, "x").is_none());

        let second = animator.animate(&target).attr("x", 0.0).start().unwrap();
        assert_eq!(animator.animation_for(&target, "x").map(|h| h.id()), Some(second.id()));
        assert_eq!(animator.animation_for(&target, "y").map(|h| h.id()), Some(first.id()));
        assert_eq!(first.attributes(), vec!["y".to_string()]);
    }

    #[test]
    fn test_stopped_animation_releases_target() {
        let scheduler = Scheduler::new();
        let animator = Animator::new(&scheduler);
        let target = sprite();

        let handle = animator.animate(&target).attr("x", 1.0).start().unwrap();
        assert_eq!(Rc::strong_count(&target), 2);

        assert!(handle.stop(false));
        assert_eq!(Rc::strong_count(&target), 1);
        assert!(animator.animation_for(&target, "x").is_none());
    }

    #[test]
    fn test_attributeless_animation_acts_as_timer() {
        let scheduler = Scheduler::new();
        let animator = Animator::new(&scheduler);
        let target = sprite();
        let finished = Rc::new(Cell::new(false));
        let flag = finished.clone();

        animator
            .animate(&target)
            .duration(1.0)
            .on_finished(move || flag.set(true))
            .start()
            .unwrap();
        scheduler.tick(0.5);
        assert!(!finished.get());

        scheduler.tick(0.5);
        assert!(finished.get());
        assert!(animator.is_empty());
    }

    #[test]
    fn test_scheduler_dropped() {
        let animator = {
            let scheduler = Scheduler::new();
            Animator::new(&scheduler)
        };
        let target = sprite();
        let finished = Rc::new(Cell::new(false));
        let flag = finished.clone();

        let result = animator
            .animate(&target)
            .attr("x", 1.0)
            .on_finished(move || flag.set(true))
            .start();
        assert_eq!(result.unwrap_err(), AnimationError::SchedulerDropped);
        assert!(animator.is_empty());
        assert!(!finished.get());
    }
}
