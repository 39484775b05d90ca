//! Cadence Animation System
//!
//! Attribute tweening driven by the cadence scheduler.
//!
//! # Features
//!
//! - **Attribute Animation**: interpolate named attributes of any
//!   [`Animatable`] target, scalars and fixed-length vectors alike
//! - **Tweens**: named easing functions in an extensible [`TweenRegistry`]
//! - **Takeover**: at most one animation drives a given attribute; a newer
//!   animation takes it over from wherever the older one left it
//! - **Scheduler-driven**: every animation is a per-tick listener, so it
//!   advances inside [`Scheduler::tick`](cadence_core::Scheduler::tick)
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use cadence_animation::{Accessor, Animatable, Animator};
//! use cadence_core::Scheduler;
//!
//! #[derive(Default)]
//! struct Ball {
//!     x: f64,
//! }
//!
//! impl Animatable for Ball {
//!     fn accessor(attribute: &str) -> Option<Accessor<Self>> {
//!         match attribute {
//!             "x" => Some(Accessor::scalar(|b| b.x, |b, x| b.x = x)),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let scheduler = Scheduler::new();
//! let animator = Animator::new(&scheduler);
//! let ball = Rc::new(RefCell::new(Ball::default()));
//!
//! let roll = animator
//!     .animate(&ball)
//!     .attr("x", 10.0)
//!     .duration(2.0)
//!     .start()
//!     .unwrap();
//!
//! scheduler.tick(1.0);
//! assert_eq!(ball.borrow().x, 5.0);
//!
//! scheduler.tick(1.0);
//! assert_eq!(ball.borrow().x, 10.0);
//! assert!(!roll.running());
//! ```

pub mod animation;
pub mod animator;
pub mod config;
pub mod error;
pub mod target;
pub mod tween;
pub mod value;

pub use animation::{AnimationHandle, AnimationId};
pub use animator::{AnimationBuilder, Animator};
pub use config::AnimatorConfig;
pub use error::AnimationError;
pub use target::{Accessor, Animatable};
pub use tween::{TweenFn, TweenRegistry};
pub use value::{AttrValue, ValueShape};
