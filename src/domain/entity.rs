/// Player pose and per-frame input intents.

use std::f32::consts::TAU;

/// Continuous player position in grid units (1.0 = one cell) plus yaw.
///
/// Yaw is measured from the +X axis towards +Z, so yaw 0 faces east on
/// the minimap and yaw π/2 faces south (down the rows).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PlayerPose {
    pub x: f32,
    pub z: f32,
    pub yaw: f32,
}

impl PlayerPose {
    pub fn new(x: f32, z: f32, yaw: f32) -> Self {
        PlayerPose { x, z, yaw: wrap_angle(yaw) }
    }

    pub fn with_position(self, x: f32, z: f32) -> Self {
        PlayerPose { x, z, ..self }
    }

    /// Unit vector the player is facing.
    pub fn forward(&self) -> (f32, f32) {
        (self.yaw.cos(), self.yaw.sin())
    }

    /// Unit vector to the player's right.
    pub fn right(&self) -> (f32, f32) {
        (-self.yaw.sin(), self.yaw.cos())
    }

    pub fn turn(&mut self, radians: f32) {
        self.yaw = wrap_angle(self.yaw + radians);
    }

    /// Integer grid cell the player stands in.
    pub fn cell(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.z.floor() as i32)
    }
}

fn wrap_angle(a: f32) -> f32 {
    a.rem_euclid(TAU)
}

/// Frame input: movement intents are continuous (held keys), turn is a
/// signed look delta in "turn units" (-1.0 = full speed left).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub turn: f32,
}

impl FrameInput {
    /// Local movement axes `(strafe, advance)`, each in -1..=1, normalised
    /// so a diagonal is no faster than a straight line.
    pub fn local_axes(&self) -> (f32, f32) {
        let strafe = self.right as i8 as f32 - self.left as i8 as f32;
        let advance = self.forward as i8 as f32 - self.back as i8 as f32;
        let len = (strafe * strafe + advance * advance).sqrt();
        if len > 1.0 {
            (strafe / len, advance / len)
        } else {
            (strafe, advance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn facing_vectors() {
        let p = PlayerPose::new(0.0, 0.0, 0.0);
        assert_eq!(p.forward(), (1.0, 0.0));
        assert!(close(p.right().0, 0.0) && close(p.right().1, 1.0));

        let south = PlayerPose::new(0.0, 0.0, FRAC_PI_2);
        assert!(close(south.forward().0, 0.0) && close(south.forward().1, 1.0));
        assert!(close(south.right().0, -1.0));
    }

    #[test]
    fn turning_wraps() {
        let mut p = PlayerPose::new(0.0, 0.0, 0.1);
        p.turn(-0.2);
        assert!(p.yaw > 0.0 && p.yaw < TAU);
        assert!(close(p.yaw, TAU - 0.1));
    }

    #[test]
    fn cell_floors_position() {
        assert_eq!(PlayerPose::new(1.99, 3.01, 0.0).cell(), (1, 3));
    }

    #[test]
    fn diagonal_intent_is_normalised() {
        let input = FrameInput { forward: true, right: true, ..Default::default() };
        let (s, a) = input.local_axes();
        assert!(close((s * s + a * a).sqrt(), 1.0));

        let opposed = FrameInput { forward: true, back: true, ..Default::default() };
        assert_eq!(opposed.local_axes(), (0.0, 0.0));
    }
}
