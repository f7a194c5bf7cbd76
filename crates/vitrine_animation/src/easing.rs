//! Easing curves
//!
//! The named curves tweens and the inertial scroller ease through, plus
//! parsing from the dotted names used in site configuration.

use std::str::FromStr;
use thiserror::Error;

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    #[default]
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseOutQuint,
    ExpoInOut,
    CircOut,
    /// Exponential settle used by the inertial scroller: `min(1, 1.001 - 2^(-10t))`
    ScrollSettle,
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Map linear progress in `[0, 1]` onto the curve
    pub fn apply(&self, t: f32) -> f32 {
        match *self {
            Easing::Linear => t,
            Easing::EaseInQuad => t.powi(2),
            Easing::EaseOutQuad => flip(t, 2),
            Easing::EaseInOutQuad => mirrored(t, 2),
            Easing::EaseInCubic => t.powi(3),
            Easing::EaseOutCubic => flip(t, 3),
            Easing::EaseInOutCubic => mirrored(t, 3),
            Easing::EaseInQuart => t.powi(4),
            Easing::EaseOutQuart => flip(t, 4),
            Easing::EaseInOutQuart => mirrored(t, 4),
            Easing::EaseOutQuint => flip(t, 5),
            Easing::ExpoInOut => expo_in_out(t),
            Easing::CircOut => (1.0 - (t - 1.0).powi(2)).max(0.0).sqrt(),
            Easing::ScrollSettle => (1.001 - 2f32.powf(-10.0 * t)).min(1.0),
            Easing::CubicBezier(x1, y1, x2, y2) => {
                Bezier::new(x1, y1, x2, y2).solve(t as f64) as f32
            }
        }
    }
}

/// Ease-out form of `t^n`
#[inline]
fn flip(t: f32, n: i32) -> f32 {
    1.0 - (1.0 - t).powi(n)
}

/// `t^n` over the first half, its ease-out mirror over the second
#[inline]
fn mirrored(t: f32, n: i32) -> f32 {
    if t < 0.5 {
        2f32.powi(n - 1) * t.powi(n)
    } else {
        1.0 - (2.0 - 2.0 * t).powi(n) / 2.0
    }
}

fn expo_in_out(t: f32) -> f32 {
    match t {
        t if t <= 0.0 => 0.0,
        t if t >= 1.0 => 1.0,
        t if t < 0.5 => 2f32.powf(20.0 * t - 10.0) / 2.0,
        t => 1.0 - 2f32.powf(10.0 - 20.0 * t) / 2.0,
    }
}

/// Unknown easing name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown easing: {0}")]
pub struct EasingParseError(pub String);

impl FromStr for Easing {
    type Err = EasingParseError;

    /// Parses the dotted curve names used in site configuration.
    ///
    /// `powerN` follows the usual web-animation convention: `power1` is
    /// quadratic, `power2` cubic, `power3` quartic, `power4` quintic.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let easing = match name.trim() {
            "none" | "linear" => Easing::Linear,
            "power1.in" => Easing::EaseInQuad,
            "power1.out" | "power1" => Easing::EaseOutQuad,
            "power1.inOut" => Easing::EaseInOutQuad,
            "power2.in" => Easing::EaseInCubic,
            "power2.out" | "power2" => Easing::EaseOutCubic,
            "power2.inOut" => Easing::EaseInOutCubic,
            "power3.in" => Easing::EaseInQuart,
            "power3.out" | "power3" => Easing::EaseOutQuart,
            "power3.inOut" => Easing::EaseInOutQuart,
            "power4.out" | "power4" => Easing::EaseOutQuint,
            "expo.inOut" => Easing::ExpoInOut,
            "circ.out" => Easing::CircOut,
            other => return Err(EasingParseError(other.to_string())),
        };
        Ok(easing)
    }
}

const EPSILON: f64 = 1e-7;

/// A `cubic-bezier(x1, y1, x2, y2)` timing curve anchored at `(0, 0)` and
/// `(1, 1)`, evaluated in f64
struct Bezier {
    x: Polynomial,
    y: Polynomial,
}

/// One axis of the curve in power form: `((a * s + b) * s + c) * s`
struct Polynomial {
    a: f64,
    b: f64,
    c: f64,
}

impl Polynomial {
    fn new(p1: f32, p2: f32) -> Self {
        let (p1, p2) = (p1 as f64, p2 as f64);
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        Self {
            a: 1.0 - c - b,
            b,
            c,
        }
    }

    fn at(&self, s: f64) -> f64 {
        ((self.a * s + self.b) * s + self.c) * s
    }

    fn derivative(&self, s: f64) -> f64 {
        (3.0 * self.a * s + 2.0 * self.b) * s + self.c
    }
}

impl Bezier {
    fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: Polynomial::new(x1, x2),
            y: Polynomial::new(y1, y2),
        }
    }

    /// The curve's y at horizontal position `x`
    fn solve(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        self.y.at(self.parameter_for(x))
    }

    /// Find `s` with `x(s) == x`: Newton first, bisection when the slope
    /// flattens out
    fn parameter_for(&self, x: f64) -> f64 {
        let mut s = x;
        for _ in 0..8 {
            let err = self.x.at(s) - x;
            if err.abs() < EPSILON {
                return s;
            }
            let slope = self.x.derivative(s);
            if slope.abs() < EPSILON {
                break;
            }
            s -= err / slope;
        }

        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        s = x;
        for _ in 0..24 {
            let current = self.x.at(s);
            if (current - x).abs() < EPSILON {
                break;
            }
            if current < x {
                lo = s;
            } else {
                hi = s;
            }
            s = 0.5 * (lo + hi);
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 14] = [
        Easing::Linear,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::EaseOutQuint,
        Easing::ExpoInOut,
        Easing::CircOut,
        Easing::CubicBezier(0.25, 0.1, 0.25, 1.0),
    ];

    #[test]
    fn test_endpoints() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-4, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-4, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_scroll_settle_curve() {
        let settle = Easing::ScrollSettle;
        // starts just above zero and saturates at exactly one
        assert!((settle.apply(0.0) - 0.001).abs() < 1e-6);
        assert_eq!(settle.apply(1.0), 1.0);
        assert!(settle.apply(0.5) > 0.96);
        assert!(settle.apply(0.2) < settle.apply(0.3));
    }

    #[test]
    fn test_out_curves_lead_linear() {
        for easing in [Easing::EaseOutCubic, Easing::EaseOutQuint, Easing::CircOut] {
            assert!(easing.apply(0.3) > 0.3);
        }
        assert!((Easing::ExpoInOut.apply(0.5) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_bezier_matches_css_ease() {
        let ease = Easing::CubicBezier(0.25, 0.1, 0.25, 1.0);
        // cubic-bezier(0.25, 0.1, 0.25, 1) is CSS `ease`, ~0.8024 at the midpoint
        assert!((ease.apply(0.5) - 0.8024).abs() < 1e-3);

        let straight = Easing::CubicBezier(0.0, 0.0, 1.0, 1.0);
        assert!((straight.apply(0.37) - 0.37).abs() < 1e-4);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("none".parse::<Easing>(), Ok(Easing::Linear));
        assert_eq!("power2.out".parse::<Easing>(), Ok(Easing::EaseOutCubic));
        assert_eq!("power3.out".parse::<Easing>(), Ok(Easing::EaseOutQuart));
        assert_eq!("power4.out".parse::<Easing>(), Ok(Easing::EaseOutQuint));
        assert_eq!("expo.inOut".parse::<Easing>(), Ok(Easing::ExpoInOut));
        assert_eq!("circ.out".parse::<Easing>(), Ok(Easing::CircOut));
        assert_eq!(
            "bounce.out".parse::<Easing>(),
            Err(EasingParseError("bounce.out".into()))
        );
    }
}
