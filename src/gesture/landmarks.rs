//! Hand landmark frames and pure geometry helpers
//!
//! Landmarks follow the 21-point hand model: wrist, then four joints per
//! digit from thumb to pinky. Coordinates are normalized to [0,1]³.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Number of points in a complete hand frame
pub const LANDMARK_COUNT: usize = 21;

/// Straightness ratio above which a finger counts as extended
const EXTENDED_RATIO: f32 = 0.85;
/// Tip-to-wrist vs knuckle-to-wrist ratio below which a finger counts as curled
const CURLED_RATIO: f32 = 1.3;
/// Max thumb-tip to index-knuckle distance for a fist
pub const FIST_THUMB_DISTANCE: f32 = 0.1;

/// A single normalized landmark
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Image-plane projection (drops depth)
    pub fn xy(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// One tracker result: exactly 21 landmarks for one hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandFrame {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build from tracker output. Partial detections (fewer than 21 points)
    /// are treated as no hand at all.
    pub fn from_slice(points: &[Landmark]) -> Option<Self> {
        if points.len() < LANDMARK_COUNT {
            return None;
        }
        let mut out = [Landmark::default(); LANDMARK_COUNT];
        out.copy_from_slice(&points[..LANDMARK_COUNT]);
        Some(Self { points: out })
    }

    /// Build from raw `[x, y, z]` triples
    pub fn from_xyz(points: &[[f32; 3]]) -> Option<Self> {
        let landmarks: Vec<Landmark> = points
            .iter()
            .map(|p| Landmark::new(p[0], p[1], p[2]))
            .collect();
        Self::from_slice(&landmarks)
    }

    #[inline]
    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// Copy of this frame with every point shifted in the image plane
    pub fn translated(&self, offset: Vec2) -> Self {
        let mut points = self.points;
        for p in points.iter_mut() {
            p.x += offset.x;
            p.y += offset.y;
        }
        Self { points }
    }
}

/// Euclidean distance in normalized landmark space
#[inline]
pub fn distance_3d(a: Landmark, b: Landmark) -> f32 {
    a.as_vec3().distance(b.as_vec3())
}

/// Straight-finger test: chord from knuckle to tip against the summed
/// segment lengths. Independent of hand size and distance from the camera.
pub fn is_finger_extended(frame: &HandFrame, mcp: usize, pip: usize, dip: usize, tip: usize) -> bool {
    let segments = distance_3d(frame.point(mcp), frame.point(pip))
        + distance_3d(frame.point(pip), frame.point(dip))
        + distance_3d(frame.point(dip), frame.point(tip));
    if segments <= f32::EPSILON {
        return false;
    }
    let chord = distance_3d(frame.point(mcp), frame.point(tip));
    chord / segments > EXTENDED_RATIO
}

/// Curled-finger test: the tip has folded back toward the wrist
pub fn is_finger_curled(frame: &HandFrame, mcp: usize, tip: usize, wrist: usize) -> bool {
    let tip_to_wrist = distance_3d(frame.point(tip), frame.point(wrist));
    let mcp_to_wrist = distance_3d(frame.point(mcp), frame.point(wrist));
    tip_to_wrist < mcp_to_wrist * CURLED_RATIO
}

/// All four fingers curled and the thumb tucked against the index knuckle
pub fn is_fist(frame: &HandFrame) -> bool {
    let fingers_curled = [
        (INDEX_MCP, INDEX_TIP),
        (MIDDLE_MCP, MIDDLE_TIP),
        (RING_MCP, RING_TIP),
        (PINKY_MCP, PINKY_TIP),
    ]
    .iter()
    .all(|&(mcp, tip)| is_finger_curled(frame, mcp, tip, WRIST));

    fingers_curled && distance_3d(frame.point(THUMB_TIP), frame.point(INDEX_MCP)) < FIST_THUMB_DISTANCE
}

/// Synthetic poses used by the headless demo and the tests
pub mod poses {
    use super::*;

    const WRIST_POS: Landmark = Landmark::new(0.5, 0.8, 0.0);
    const THUMB_OPEN: Vec2 = Vec2::new(0.38, 0.62);
    const THUMB_PRESSED: Vec2 = Vec2::new(0.47, 0.60);

    fn base() -> [Landmark; LANDMARK_COUNT] {
        let mut p = [Landmark::default(); LANDMARK_COUNT];
        p[WRIST] = WRIST_POS;
        p[THUMB_CMC] = Landmark::new(0.45, 0.75, 0.0);
        p[THUMB_MCP] = Landmark::new(0.41, 0.70, 0.0);
        p[THUMB_IP] = Landmark::new(0.39, 0.66, 0.0);
        p[THUMB_TIP] = Landmark::new(THUMB_OPEN.x, THUMB_OPEN.y, 0.0);
        // Ring and pinky folded into the palm
        p[RING_MCP] = Landmark::new(0.57, 0.63, 0.0);
        p[RING_PIP] = Landmark::new(0.58, 0.58, 0.0);
        p[RING_DIP] = Landmark::new(0.58, 0.63, 0.0);
        p[RING_TIP] = Landmark::new(0.57, 0.68, 0.0);
        p[PINKY_MCP] = Landmark::new(0.60, 0.66, 0.0);
        p[PINKY_PIP] = Landmark::new(0.61, 0.62, 0.0);
        p[PINKY_DIP] = Landmark::new(0.61, 0.66, 0.0);
        p[PINKY_TIP] = Landmark::new(0.60, 0.70, 0.0);
        p
    }

    fn extend_index(p: &mut [Landmark; LANDMARK_COUNT]) {
        p[INDEX_MCP] = Landmark::new(0.50, 0.60, 0.0);
        p[INDEX_PIP] = Landmark::new(0.50, 0.53, 0.0);
        p[INDEX_DIP] = Landmark::new(0.50, 0.48, 0.0);
        p[INDEX_TIP] = Landmark::new(0.50, 0.44, 0.0);
    }

    fn curl_index(p: &mut [Landmark; LANDMARK_COUNT]) {
        p[INDEX_MCP] = Landmark::new(0.50, 0.60, 0.0);
        p[INDEX_PIP] = Landmark::new(0.50, 0.55, 0.0);
        p[INDEX_DIP] = Landmark::new(0.51, 0.60, 0.0);
        p[INDEX_TIP] = Landmark::new(0.51, 0.64, 0.0);
    }

    fn extend_middle(p: &mut [Landmark; LANDMARK_COUNT]) {
        p[MIDDLE_MCP] = Landmark::new(0.54, 0.61, 0.0);
        p[MIDDLE_PIP] = Landmark::new(0.54, 0.54, 0.0);
        p[MIDDLE_DIP] = Landmark::new(0.54, 0.49, 0.0);
        p[MIDDLE_TIP] = Landmark::new(0.54, 0.45, 0.0);
    }

    fn curl_middle(p: &mut [Landmark; LANDMARK_COUNT]) {
        p[MIDDLE_MCP] = Landmark::new(0.54, 0.61, 0.0);
        p[MIDDLE_PIP] = Landmark::new(0.54, 0.56, 0.0);
        p[MIDDLE_DIP] = Landmark::new(0.55, 0.61, 0.0);
        p[MIDDLE_TIP] = Landmark::new(0.55, 0.65, 0.0);
    }

    fn set_thumb(p: &mut [Landmark; LANDMARK_COUNT], pressed: f32) {
        let t = pressed.clamp(0.0, 1.0);
        let tip = THUMB_OPEN.lerp(THUMB_PRESSED, t);
        p[THUMB_TIP] = Landmark::new(tip.x, tip.y, 0.0);
    }

    /// Full gun pose (index + middle out, ring + pinky curled).
    /// `pressed` moves the thumb from cocked (0.0) to touching the index knuckle (1.0).
    pub fn gun(pressed: f32) -> HandFrame {
        let mut p = base();
        extend_index(&mut p);
        extend_middle(&mut p);
        set_thumb(&mut p, pressed);
        HandFrame::new(p)
    }

    /// Lenient gun pose: only the index finger is out
    pub fn pointing(pressed: f32) -> HandFrame {
        let mut p = base();
        extend_index(&mut p);
        curl_middle(&mut p);
        set_thumb(&mut p, pressed);
        HandFrame::new(p)
    }

    /// Closed fist with the thumb over the index knuckle
    pub fn fist() -> HandFrame {
        let mut p = base();
        curl_index(&mut p);
        curl_middle(&mut p);
        p[THUMB_TIP] = Landmark::new(0.50, 0.65, 0.0);
        HandFrame::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::poses;
    use super::*;

    #[test]
    fn test_distance_3d() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.3, 0.4, 0.0);
        assert!((distance_3d(a, b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_from_slice_requires_full_hand() {
        let partial = vec![Landmark::default(); 20];
        assert!(HandFrame::from_slice(&partial).is_none());
        let full = vec![Landmark::default(); 21];
        assert!(HandFrame::from_slice(&full).is_some());
    }

    #[test]
    fn test_gun_pose_flags() {
        let frame = poses::gun(0.0);
        assert!(is_finger_extended(&frame, INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP));
        assert!(is_finger_extended(&frame, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP));
        assert!(is_finger_curled(&frame, RING_MCP, RING_TIP, WRIST));
        assert!(is_finger_curled(&frame, PINKY_MCP, PINKY_TIP, WRIST));
        assert!(!is_fist(&frame));
    }

    #[test]
    fn test_extension_is_scale_invariant() {
        // Same straight finger at half the size
        let mut points = *poses::gun(0.0).points();
        for p in points.iter_mut() {
            p.x *= 0.5;
            p.y *= 0.5;
        }
        let small = HandFrame::new(points);
        assert!(is_finger_extended(&small, INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP));
    }

    #[test]
    fn test_fist_pose() {
        let frame = poses::fist();
        assert!(is_fist(&frame));
        assert!(!is_finger_extended(&frame, INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP));
    }

    #[test]
    fn test_degenerate_finger_not_extended() {
        let frame = HandFrame::new([Landmark::default(); LANDMARK_COUNT]);
        assert!(!is_finger_extended(&frame, INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP));
    }
}
