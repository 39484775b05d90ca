//! Animatable targets
//!
//! A type opts into animation by implementing [`Animatable`], a closed table
//! from attribute names to getter/setter pairs. The table is consulted once
//! per attribute when an animation starts; every frame after that goes
//! straight through the resolved [`Accessor`].
//!
//! ```ignore
//! struct Sprite { x: f64, pos: [f64; 2] }
//!
//! impl Animatable for Sprite {
//!     fn accessor(attribute: &str) -> Option<Accessor<Self>> {
//!         match attribute {
//!             "x" => Some(Accessor::scalar(|s| s.x, |s, v| s.x = v)),
//!             "pos" => Some(Accessor::vector(|s| s.pos, |s, v| s.pos = v)),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::rc::Rc;

use crate::value::AttrValue;

/// Something whose named attributes can be interpolated
pub trait Animatable: 'static {
    /// Resolve `attribute` to its accessor, or `None` if it cannot be animated
    fn accessor(attribute: &str) -> Option<Accessor<Self>>
    where
        Self: Sized;
}

/// Getter/setter pair for one attribute of `T`
///
/// Setters run the target's own mutation logic, so side effects such as
/// marking a sprite dirty still happen while it is being animated.
pub struct Accessor<T> {
    get: Rc<dyn Fn(&T) -> AttrValue>,
    set: Rc<dyn Fn(&mut T, &AttrValue)>,
}

impl<T: 'static> Accessor<T> {
    /// Accessor over raw [`AttrValue`]s
    pub fn new(get: fn(&T) -> AttrValue, set: fn(&mut T, AttrValue)) -> Self {
        Self {
            get: Rc::new(get),
            set: Rc::new(move |target: &mut T, value: &AttrValue| set(target, value.clone())),
        }
    }

    /// Accessor for a single number
    pub fn scalar(get: fn(&T) -> f64, set: fn(&mut T, f64)) -> Self {
        Self {
            get: Rc::new(move |target: &T| AttrValue::Scalar(get(target))),
            set: Rc::new(move |target: &mut T, value: &AttrValue| {
                if let Some(value) = value.as_scalar() {
                    set(target, value);
                }
            }),
        }
    }

    /// Accessor for a fixed-length array, e.g. a position or a color
    pub fn vector<const N: usize>(get: fn(&T) -> [f64; N], set: fn(&mut T, [f64; N])) -> Self {
        Self {
            get: Rc::new(move |target: &T| AttrValue::from(get(target))),
            set: Rc::new(move |target: &mut T, value: &AttrValue| {
                if let Ok(values) = <[f64; N]>::try_from(value.as_slice()) {
                    set(target, values);
                }
            }),
        }
    }

    pub fn get(&self, target: &T) -> AttrValue {
        (self.get)(target)
    }

    /// Write `value`; values of the wrong shape are ignored
    pub fn set(&self, target: &mut T, value: &AttrValue) {
        (self.set)(target, value)
    }
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        Self {
            get: Rc::clone(&self.get),
            set: Rc::clone(&self.set),
        }
    }
}

impl<T> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sprite {
        x: f64,
        pos: [f64; 2],
        dirty: bool,
    }

    impl Sprite {
        fn set_x(&mut self, x: f64) {
            self.x = x;
            self.dirty = true;
        }
    }

    impl Animatable for Sprite {
        fn accessor(attribute: &str) -> Option<Accessor<Self>> {
            match attribute {
                "x" => Some(Accessor::scalar(|s| s.x, Sprite::set_x)),
                "pos" => Some(Accessor::vector(|s| s.pos, |s, v| s.pos = v)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_scalar_accessor_runs_setter() {
        let mut sprite = Sprite::default();
        let x = Sprite::accessor("x").unwrap();

        x.set(&mut sprite, &AttrValue::Scalar(3.0));
        assert_eq!(x.get(&sprite), AttrValue::Scalar(3.0));
        assert!(sprite.dirty);
    }

    #[test]
    fn test_vector_accessor_ignores_wrong_length() {
        let mut sprite = Sprite::default();
        let pos = Sprite::accessor("pos").unwrap();

        pos.set(&mut sprite, &AttrValue::from([4.0, 5.0]));
        assert_eq!(sprite.pos, [4.0, 5.0]);

        pos.set(&mut sprite, &AttrValue::from([1.0, 2.0, 3.0]));
        assert_eq!(sprite.pos, [4.0, 5.0]);
    }

    #[test]
    fn test_unknown_attribute() {
        assert!(Sprite::accessor("rotation").is_none());
    }
}
