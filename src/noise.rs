//! Coherent gradient noise over the plane.
//!
//! Gradients are hashed straight from the lattice coordinates with a pair of
//! trigonometric functions, so there is no permutation table and no seed: the
//! field is a fixed, pure function of `(x, y)`.

/// Unit gradient attached to the lattice point `(ix, iy)`.
fn lattice_gradient(ix: i32, iy: i32) -> (f32, f32) {
    let (fx, fy) = (ix as f32, iy as f32);
    let angle = 2920.0
        * (fx * 21942.0 + fy * 171324.0 + 8912.0).sin()
        * (fx * 23157.0 * fy + 217832.0 + 9758.0).cos();
    (angle.cos(), angle.sin())
}

/// Dot product of the lattice gradient with the offset from the lattice
/// point to the sample.
fn dot_gradient(ix: i32, iy: i32, x: f32, y: f32) -> f32 {
    let (gx, gy) = lattice_gradient(ix, iy);
    (x - ix as f32) * gx + (y - iy as f32) * gy
}

/// Cubic Hermite blend, `w^2 (3 - 2w)`.
fn smoothstep(a0: f32, a1: f32, w: f32) -> f32 {
    (a1 - a0) * w * w * (3.0 - 2.0 * w) + a0
}

/// Samples the noise field. The result lies roughly in `[-1, 1]` and is
/// continuous in both arguments.
pub fn noise(x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let sx = x - x0 as f32;
    let sy = y - y0 as f32;

    let top = smoothstep(
        dot_gradient(x0, y0, x, y),
        dot_gradient(x1, y0, x, y),
        sx,
    );
    let bottom = smoothstep(
        dot_gradient(x0, y1, x, y),
        dot_gradient(x1, y1, x, y),
        sx,
    );

    smoothstep(top, bottom, sy)
}
