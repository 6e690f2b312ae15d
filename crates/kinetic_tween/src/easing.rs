//! Easing functions with exact derivatives
//!
//! An easing maps progress `t` in `[0, 1]` to an interpolated value between
//! two boundary values, and exposes the derivative of that mapping so the
//! scheduler can read off instantaneous speeds. The `Smooth`/`SmoothWith`
//! variants are *blendable*: their start speed can be overridden at runtime,
//! which is how an interrupting tween inherits velocity from the tween it
//! replaces.

/// Easing function type
///
/// `interp` returns the value at progress `t`; `speed` returns its exact
/// derivative with respect to `t`, in value units per unit progress. The
/// real-world rate of change is `speed / duration`.
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
    CubicBezier(f32, f32, f32, f32),
    /// Quintic Hermite with zero speed and zero acceleration at both ends.
    /// Blendable.
    Smooth,
    /// Quintic Hermite with configured endpoint speeds, in value units per
    /// unit progress. Blendable.
    SmoothWith { start_speed: f32, end_speed: f32 },
}

impl Easing {
    /// Interpolate between `v0` and `v1` at progress `t` (clamped to `[0, 1]`).
    ///
    /// Endpoints are always exact: `interp(v0, v1, 1.0) == v1` for every
    /// variant, independent of rounding in the curve body.
    pub fn interp(&self, v0: f32, v1: f32, t: f32) -> f32 {
        if t <= 0.0 {
            return v0;
        }
        if t >= 1.0 {
            return v1;
        }
        let d = v1 - v0;
        match self {
            Easing::Linear => v0 + d * t,
            Easing::EaseInQuad => v0 + d * t * t,
            Easing::EaseOutQuad => v0 + d * (1.0 - (1.0 - t) * (1.0 - t)),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    v0 + d * 2.0 * t * t
                } else {
                    v0 + d * (1.0 - (-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Easing::EaseInCubic => v0 + d * t * t * t,
            Easing::EaseOutCubic => v0 + d * (1.0 - (1.0 - t).powi(3)),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    v0 + d * 4.0 * t * t * t
                } else {
                    v0 + d * (1.0 - (-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Easing::EaseInQuart => v0 + d * t * t * t * t,
            Easing::EaseOutQuart => v0 + d * (1.0 - (1.0 - t).powi(4)),
            Easing::EaseInOutQuart => {
                if t < 0.5 {
                    v0 + d * 8.0 * t * t * t * t
                } else {
                    v0 + d * (1.0 - (-2.0 * t + 2.0).powi(4) / 2.0)
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => {
                v0 + d * bezier_ease(t, *x1, *y1, *x2, *y2)
            }
            Easing::Smooth => quintic(v0, v1, 0.0, 0.0, t),
            Easing::SmoothWith {
                start_speed,
                end_speed,
            } => quintic(v0, v1, *start_speed, *end_speed, t),
        }
    }

    /// Derivative of [`interp`](Self::interp) with respect to `t`, in value
    /// units per unit progress.
    pub fn speed(&self, v0: f32, v1: f32, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let d = v1 - v0;
        match self {
            Easing::Linear => d,
            Easing::EaseInQuad => d * 2.0 * t,
            Easing::EaseOutQuad => d * 2.0 * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    d * 4.0 * t
                } else {
                    d * 2.0 * (-2.0 * t + 2.0)
                }
            }
            Easing::EaseInCubic => d * 3.0 * t * t,
            Easing::EaseOutCubic => d * 3.0 * (1.0 - t) * (1.0 - t),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    d * 12.0 * t * t
                } else {
                    d * 3.0 * (-2.0 * t + 2.0).powi(2)
                }
            }
            Easing::EaseInQuart => d * 4.0 * t * t * t,
            Easing::EaseOutQuart => d * 4.0 * (1.0 - t).powi(3),
            Easing::EaseInOutQuart => {
                if t < 0.5 {
                    d * 32.0 * t * t * t
                } else {
                    d * 4.0 * (-2.0 * t + 2.0).powi(3)
                }
            }
            // The bezier shape is solved numerically, so its derivative is
            // taken the same way.
            Easing::CubicBezier(x1, y1, x2, y2) => {
                let h = 1e-3;
                let lo = (t - h).max(0.0);
                let hi = (t + h).min(1.0);
                let y_lo = bezier_ease(lo, *x1, *y1, *x2, *y2);
                let y_hi = bezier_ease(hi, *x1, *y1, *x2, *y2);
                d * (y_hi - y_lo) / (hi - lo)
            }
            Easing::Smooth => quintic_speed(v0, v1, 0.0, 0.0, t),
            Easing::SmoothWith {
                start_speed,
                end_speed,
            } => quintic_speed(v0, v1, *start_speed, *end_speed, t),
        }
    }

    /// Whether this easing supports a runtime start-speed override.
    pub fn is_blendable(&self) -> bool {
        matches!(self, Easing::Smooth | Easing::SmoothWith { .. })
    }

    /// Interpolate with the configured start speed replaced by `start_speed`.
    ///
    /// Non-blendable variants ignore the override.
    pub fn interp_blended(&self, v0: f32, v1: f32, t: f32, start_speed: f32) -> f32 {
        if t <= 0.0 {
            return v0;
        }
        if t >= 1.0 {
            return v1;
        }
        match self {
            Easing::Smooth => quintic(v0, v1, start_speed, 0.0, t),
            Easing::SmoothWith { end_speed, .. } => quintic(v0, v1, start_speed, *end_speed, t),
            _ => self.interp(v0, v1, t),
        }
    }

    /// Derivative of [`interp_blended`](Self::interp_blended) with respect
    /// to `t`.
    pub fn speed_blended(&self, v0: f32, v1: f32, t: f32, start_speed: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Smooth => quintic_speed(v0, v1, start_speed, 0.0, t),
            Easing::SmoothWith { end_speed, .. } => {
                quintic_speed(v0, v1, start_speed, *end_speed, t)
            }
            _ => self.speed(v0, v1, t),
        }
    }
}

/// Quintic Hermite from `v0` to `v1` with endpoint speeds `s0`/`s1` (value
/// units per unit progress) and zero endpoint acceleration.
///
/// Coefficients come from the boundary conditions p(0)=v0, p(1)=v1,
/// p'(0)=s0, p'(1)=s1, p''(0)=p''(1)=0. At `s0 = s1 = 0` this reduces to
/// `v0 + d(10t^3 - 15t^4 + 6t^5)`.
fn quintic(v0: f32, v1: f32, s0: f32, s1: f32, t: f32) -> f32 {
    let d = (v1 - v0) - s0;
    let c3 = 10.0 * d + 4.0 * s0 - 4.0 * s1;
    let c4 = -15.0 * d - 7.0 * s0 + 7.0 * s1;
    let c5 = 6.0 * d + 3.0 * s0 - 3.0 * s1;
    v0 + s0 * t + (c3 + (c4 + c5 * t) * t) * t * t * t
}

/// Exact derivative of [`quintic`] with respect to `t`.
fn quintic_speed(v0: f32, v1: f32, s0: f32, s1: f32, t: f32) -> f32 {
    let d = (v1 - v0) - s0;
    let c3 = 10.0 * d + 4.0 * s0 - 4.0 * s1;
    let c4 = -15.0 * d - 7.0 * s0 + 7.0 * s1;
    let c5 = 6.0 * d + 3.0 * s0 - 3.0 * s1;
    s0 + (3.0 * c3 + (4.0 * c4 + 5.0 * c5 * t) * t) * t * t
}

/// Cubic bezier shape evaluation (matches CSS timing functions).
///
/// Solves for the curve parameter with Newton-Raphson and falls back to
/// bisection when the slope flattens out. Computed in f64 to keep repeated
/// per-frame evaluation jitter-free.
fn bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let x = t as f64;
    let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);

    let mut p = x;
    for _ in 0..8 {
        let err = bezier_axis(p, x1, x2) - x;
        if err.abs() < 1e-7 {
            return bezier_axis(p, y1, y2) as f32;
        }
        let slope = bezier_axis_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    p = x;
    for _ in 0..24 {
        let val = bezier_axis(p, x1, x2);
        if (val - x).abs() < 1e-7 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_axis(p, y1, y2) as f32
}

/// One axis of the bezier: B(u) = 3(1-u)^2 u p1 + 3(1-u) u^2 p2 + u^3.
#[inline]
fn bezier_axis(u: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * u + b) * u + c) * u
}

#[inline]
fn bezier_axis_slope(u: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * u + 2.0 * b) * u + c
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARIANTS: [Easing; 13] = [
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
        Easing::CubicBezier(0.25, 0.1, 0.25, 1.0),
        Easing::Smooth,
        Easing::SmoothWith {
            start_speed: 2.0,
            end_speed: -1.0,
        },
    ];

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_endpoints_exact() {
        for ease in VARIANTS {
            assert_eq!(ease.interp(3.0, 17.5, 0.0), 3.0, "{ease:?} start");
            assert_eq!(ease.interp(3.0, 17.5, 1.0), 17.5, "{ease:?} end");
        }
    }

    #[test]
    fn test_progress_clamped() {
        for ease in VARIANTS {
            assert_eq!(ease.interp(0.0, 1.0, -0.5), 0.0, "{ease:?}");
            assert_eq!(ease.interp(0.0, 1.0, 1.5), 1.0, "{ease:?}");
        }
    }

    #[test]
    fn test_speed_matches_finite_difference() {
        let h = 1e-3f32;
        for ease in VARIANTS {
            for t in [0.1, 0.3, 0.45, 0.6, 0.8, 0.9] {
                let numeric = (ease.interp(0.0, 10.0, t + h) - ease.interp(0.0, 10.0, t - h))
                    / (2.0 * h);
                let analytic = ease.speed(0.0, 10.0, t);
                assert!(
                    approx_eq(numeric, analytic, 0.05),
                    "{ease:?} at t={t}: numeric {numeric} vs analytic {analytic}"
                );
            }
        }
    }

    #[test]
    fn test_smooth_endpoint_speeds_are_zero() {
        assert_eq!(Easing::Smooth.speed(0.0, 10.0, 0.0), 0.0);
        assert!(approx_eq(Easing::Smooth.speed(0.0, 10.0, 1.0), 0.0, 1e-4));
    }

    #[test]
    fn test_smooth_with_honors_endpoint_speeds() {
        let ease = Easing::SmoothWith {
            start_speed: 4.0,
            end_speed: -2.0,
        };
        assert!(approx_eq(ease.speed(0.0, 10.0, 0.0), 4.0, 1e-4));
        assert!(approx_eq(ease.speed(0.0, 10.0, 1.0), -2.0, 1e-3));
    }

    #[test]
    fn test_blended_override_sets_start_speed() {
        assert!(approx_eq(
            Easing::Smooth.speed_blended(0.0, 10.0, 0.0, 7.5),
            7.5,
            1e-4
        ));
        // the configured end speed is untouched
        assert!(approx_eq(
            Easing::Smooth.speed_blended(0.0, 10.0, 1.0, 7.5),
            0.0,
            1e-3
        ));
    }

    #[test]
    fn test_blend_with_equal_boundaries_still_moves() {
        // A tween re-targeted to where it already is keeps its momentum:
        // the value bulges away and returns.
        let mid = Easing::Smooth.interp_blended(5.0, 5.0, 0.25, 8.0);
        assert!(mid > 5.0);
        assert_eq!(Easing::Smooth.interp_blended(5.0, 5.0, 1.0, 8.0), 5.0);
    }

    #[test]
    fn test_blended_ignored_by_non_blendable() {
        assert!(!Easing::Linear.is_blendable());
        assert_eq!(
            Easing::Linear.interp_blended(0.0, 10.0, 0.5, 99.0),
            Easing::Linear.interp(0.0, 10.0, 0.5)
        );
    }

    #[test]
    fn test_smooth_is_classic_quintic() {
        // 10t^3 - 15t^4 + 6t^5 at t = 0.5 is 0.5
        assert!(approx_eq(Easing::Smooth.interp(0.0, 1.0, 0.5), 0.5, 1e-6));
        // midpoint speed of the zero-endpoint quintic is 30d/16
        assert!(approx_eq(Easing::Smooth.speed(0.0, 1.0, 0.5), 1.875, 1e-5));
    }

    #[test]
    fn test_bezier_is_monotonic_for_css_ease() {
        let ease = Easing::CubicBezier(0.25, 0.1, 0.25, 1.0);
        let mut last = 0.0;
        for i in 1..=20 {
            let v = ease.interp(0.0, 1.0, i as f32 / 20.0);
            assert!(v >= last - 1e-5);
            last = v;
        }
    }
}
