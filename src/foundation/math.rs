/// Clamp into `[0, 1]`. NaN maps to `0`.
#[inline]
pub(crate) fn saturate(v: f32) -> f32 {
    v.max(0.0).min(1.0)
}

/// Component-wise `a / b` that stays finite when `b` has zero components.
///
/// Zero divisors first produce `0`, then the affected components are filled from the
/// remaining ones so the result stays as gray as possible.
pub(crate) fn safe_divide_even_color(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    let div = |n: f32, d: f32| if d != 0.0 { n / d } else { 0.0 };
    let mut x = div(a[0], b[0]);
    let mut y = div(a[1], b[1]);
    let mut z = div(a[2], b[2]);

    if b[0] == 0.0 {
        if b[1] == 0.0 {
            x = z;
            y = z;
        } else if b[2] == 0.0 {
            x = y;
            z = y;
        } else {
            x = 0.5 * (y + z);
        }
    } else if b[1] == 0.0 {
        if b[2] == 0.0 {
            y = x;
            z = x;
        } else {
            y = 0.5 * (x + z);
        }
    } else if b[2] == 0.0 {
        z = 0.5 * (x + y);
    }

    [x, y, z]
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
