//! Interpolatable attribute values

use std::fmt;

use smallvec::SmallVec;

/// Shape of an [`AttrValue`]; start and end values must agree on it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueShape {
    Scalar,
    Vector(usize),
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueShape::Scalar => f.write_str("scalar"),
            ValueShape::Vector(len) => write!(f, "vector of {len}"),
        }
    }
}

/// A value an animation can drive: a number or a fixed-length sequence of them
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Scalar(f64),
    Vector(SmallVec<[f64; 4]>),
}

impl AttrValue {
    pub fn shape(&self) -> ValueShape {
        match self {
            AttrValue::Scalar(_) => ValueShape::Scalar,
            AttrValue::Vector(values) => ValueShape::Vector(values.len()),
        }
    }

    /// Interpolate elementwise toward `end`: `a + (b - a) * t`
    ///
    /// `t` is not clamped, so overshooting tweens extrapolate. When the shapes
    /// differ `end` is returned unchanged.
    pub fn lerp(&self, end: &AttrValue, t: f64) -> AttrValue {
        match (self, end) {
            (AttrValue::Scalar(a), AttrValue::Scalar(b)) => AttrValue::Scalar(lerp(*a, *b, t)),
            (AttrValue::Vector(a), AttrValue::Vector(b)) if a.len() == b.len() => {
                AttrValue::Vector(a.iter().zip(b).map(|(a, b)| lerp(*a, *b, t)).collect())
            }
            _ => end.clone(),
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            AttrValue::Scalar(value) => Some(*value),
            AttrValue::Vector(_) => None,
        }
    }

    /// Elements of the value; a scalar is a one-element slice
    pub fn as_slice(&self) -> &[f64] {
        match self {
            AttrValue::Scalar(value) => std::slice::from_ref(value),
            AttrValue::Vector(values) => values,
        }
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Scalar(value) => write!(f, "{value}"),
            AttrValue::Vector(values) => write!(f, "{:?}", values.as_slice()),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Scalar(value)
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        AttrValue::Scalar(value as f64)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Scalar(value as f64)
    }
}

impl<const N: usize> From<[f64; N]> for AttrValue {
    fn from(values: [f64; N]) -> Self {
        AttrValue::Vector(SmallVec::from_slice(&values))
    }
}

impl From<(f64, f64)> for AttrValue {
    fn from((x, y): (f64, f64)) -> Self {
        AttrValue::Vector(SmallVec::from_slice(&[x, y]))
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(values: Vec<f64>) -> Self {
        AttrValue::Vector(SmallVec::from_vec(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_lerp() {
        let start = AttrValue::from(0.0);
        let end = AttrValue::from(10);
        assert_eq!(start.lerp(&end, 0.5), AttrValue::Scalar(5.0));
        assert_eq!(start.lerp(&end, 1.2), AttrValue::Scalar(12.0));
    }

    #[test]
    fn test_vector_lerp_is_elementwise() {
        let start = AttrValue::from([0.0, 100.0, 4.0]);
        let end = AttrValue::from(vec![10.0, 0.0, 4.0]);
        assert_eq!(start.shape(), ValueShape::Vector(3));
        assert_eq!(start.lerp(&end, 0.25).as_slice(), &[2.5, 75.0, 4.0]);
    }

    #[test]
    fn test_mismatched_shapes_jump_to_end() {
        let start = AttrValue::from((1.0, 2.0));
        let end = AttrValue::from(5.0);
        assert_eq!(start.lerp(&end, 0.1), end);
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(ValueShape::Scalar.to_string(), "scalar");
        assert_eq!(ValueShape::Vector(2).to_string(), "vector of 2");
        assert_eq!(AttrValue::from(1.5f32).as_scalar(), Some(1.5));
    }
}
