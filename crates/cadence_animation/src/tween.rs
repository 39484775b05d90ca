//! Tween (easing) functions and the named registry animations resolve them from

use std::f64::consts::PI;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::AnimationError;

/// A tween maps normalized progress `[0, 1]` to eased progress.
///
/// Plain function pointers keep tweens pure: they cannot capture state.
/// Elastic tweens overshoot `[0, 1]` on purpose.
pub type TweenFn = fn(f64) -> f64;

/// Built-in tweens, registered under these names by [`TweenRegistry::new`]
pub const BUILTIN_TWEENS: &[(&str, TweenFn)] = &[
    ("linear", linear),
    ("accelerate", accelerate),
    ("decelerate", decelerate),
    ("accel_decel", accel_decel),
    ("in_elastic", in_elastic),
    ("out_elastic", out_elastic),
    ("in_out_elastic", in_out_elastic),
    ("bounce_end", bounce_end),
    ("bounce_start", bounce_start),
    ("bounce_start_end", bounce_start_end),
];

/// Similarity (0..=1) a name needs to be offered as a suggestion
const SUGGESTION_CUTOFF: f64 = 0.6;
const MAX_SUGGESTIONS: usize = 3;

pub fn linear(n: f64) -> f64 {
    n
}

pub fn accelerate(n: f64) -> f64 {
    n * n
}

pub fn decelerate(n: f64) -> f64 {
    -n * (n - 2.0)
}

/// Accelerate through the first half, decelerate through the second
pub fn accel_decel(n: f64) -> f64 {
    let p = n * 2.0;
    if p < 1.0 {
        return 0.5 * p * p;
    }
    let p = p - 1.0;
    -0.5 * (p * (p - 2.0) - 1.0)
}

pub fn in_elastic(n: f64) -> f64 {
    let p = 0.3;
    let s = p / 4.0;
    if n == 1.0 {
        return 1.0;
    }
    let q = n - 1.0;
    -(2f64.powf(10.0 * q) * ((q - s) * (2.0 * PI) / p).sin())
}

pub fn out_elastic(n: f64) -> f64 {
    let p = 0.3;
    let s = p / 4.0;
    if n == 1.0 {
        return 1.0;
    }
    2f64.powf(-10.0 * n) * ((n - s) * (2.0 * PI) / p).sin() + 1.0
}

pub fn in_out_elastic(n: f64) -> f64 {
    let p = 0.3 * 1.5;
    let s = p / 4.0;
    let q = n * 2.0;
    if q == 2.0 {
        return 1.0;
    }
    let q = q - 1.0;
    let wave = ((q - s) * (2.0 * PI) / p).sin();
    if q < 0.0 {
        -0.5 * (2f64.powf(10.0 * q) * wave)
    } else {
        2f64.powf(-10.0 * q) * wave * 0.5 + 1.0
    }
}

/// Four parabolic bounces of decreasing height, settling at 1.0
fn out_bounce(p: f64) -> f64 {
    if p < 1.0 / 2.75 {
        7.5625 * p * p
    } else if p < 2.0 / 2.75 {
        let p = p - 1.5 / 2.75;
        7.5625 * p * p + 0.75
    } else if p < 2.5 / 2.75 {
        let p = p - 2.25 / 2.75;
        7.5625 * p * p + 0.9375
    } else {
        let p = p - 2.625 / 2.75;
        7.5625 * p * p + 0.984375
    }
}

fn in_bounce(p: f64) -> f64 {
    1.0 - out_bounce(1.0 - p)
}

pub fn bounce_end(n: f64) -> f64 {
    out_bounce(n)
}

pub fn bounce_start(n: f64) -> f64 {
    in_bounce(n)
}

pub fn bounce_start_end(n: f64) -> f64 {
    if n < 0.5 {
        in_bounce(n * 2.0) * 0.5
    } else {
        out_bounce(n * 2.0 - 1.0) * 0.5 + 0.5
    }
}

/// Named tween catalog
///
/// New tweens are added with [`register`](Self::register); animations only
/// ever look tweens up by name, so nothing else needs to change.
#[derive(Clone)]
pub struct TweenRegistry {
    tweens: FxHashMap<String, TweenFn>,
}

impl TweenRegistry {
    /// Create a registry holding the built-in tweens
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for &(name, tween) in BUILTIN_TWEENS {
            registry.register(name, tween);
        }
        registry
    }

    /// Create a registry with no tweens at all
    pub fn empty() -> Self {
        Self {
            tweens: FxHashMap::default(),
        }
    }

    /// Register `tween` under `name`, returning the tween it replaced
    pub fn register(&mut self, name: impl Into<String>, tween: TweenFn) -> Option<TweenFn> {
        self.tweens.insert(name.into(), tween)
    }

    pub fn get(&self, name: &str) -> Option<TweenFn> {
        self.tweens.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tweens.contains_key(name)
    }

    /// Look up `name`, failing with close matches when it is unknown
    pub fn resolve(&self, name: &str) -> Result<TweenFn, AnimationError> {
        self.get(name).ok_or_else(|| AnimationError::UnknownTween {
            name: name.to_string(),
            suggestions: self.suggestions(name),
        })
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tweens.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered names that look like `name`, best match first
    pub fn suggestions(&self, name: &str) -> Vec<String> {
        let mut scored: Vec<(f64, &str)> = self
            .tweens
            .keys()
            .map(|candidate| (similarity(name, candidate), candidate.as_str()))
            .filter(|(score, _)| *score >= SUGGESTION_CUTOFF)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, candidate)| candidate.to_string())
            .collect()
    }
}

impl Default for TweenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TweenRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Normalized edit-distance similarity in `0..=1`
fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[b.len()]
}
