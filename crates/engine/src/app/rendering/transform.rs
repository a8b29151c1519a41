/// 2D affine transform in column-major `[a, b, c, d, tx, ty]` form:
/// `(x, y) -> (a*x + c*y + tx, b*x + d*y + ty)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2 {
    pub m: [f32; 6],
}

impl Transform2 {
    pub const IDENTITY: Transform2 = Transform2 {
        m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    /// Appends a translation by `(dx, dy)`.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        let [a, b, c, d, tx, ty] = self.m;
        self.m = [a, b, c, d, a * dx + c * dy + tx, b * dx + d * dy + ty];
    }

    /// Maps a point through the transform.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, tx, ty] = self.m;
        (a * x + c * y + tx, b * x + d * y + ty)
    }

    pub fn is_identity(&self) -> bool {
        self.m == Self::IDENTITY.m
    }
}

impl Default for Transform2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_maps_points_unchanged() {
        let t = Transform2::IDENTITY;
        assert_eq!(t.apply(12.5, -3.0), (12.5, -3.0));
    }

    #[test]
    fn translate_offsets_points() {
        let mut t = Transform2::IDENTITY;
        t.translate(10.0, -4.0);
        assert_eq!(t.apply(2.0, 3.0), (12.0, -1.0));
    }

    #[test]
    fn translations_compose() {
        let mut t = Transform2::IDENTITY;
        t.translate(5.0, 5.0);
        t.translate(-2.0, 1.0);
        assert_eq!(t.apply(0.0, 0.0), (3.0, 6.0));
    }

    #[test]
    fn copy_round_trip_is_bit_identical() {
        let mut t = Transform2::IDENTITY;
        t.translate(0.1, 0.2);
        t.translate(-7.3, 1e-6);

        let saved = t;
        t.translate(100.0, 200.0);
        t = saved;

        assert_eq!(t.m.map(f32::to_bits), saved.m.map(f32::to_bits));
    }
}
