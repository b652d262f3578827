use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;

/// Index of a fixed-width horizontal slice of the world.
pub type SectionIndex = i32;

/// Fixed-width partitioning of a one-dimensional world.
///
/// Section `i` covers the half-open world range `[i * width, (i + 1) * width)`.
/// The width is chosen once per level and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionGrid {
    section_width: f32,
    max_section: SectionIndex,
}

impl SectionGrid {
    /// Create a grid with an explicit last valid section.
    pub fn new(section_width: f32, max_section: SectionIndex) -> Self {
        assert!(section_width > 0.0, "section_width must be positive");
        Self {
            section_width,
            max_section: max_section.max(0),
        }
    }

    /// Create a grid covering `[0, world_width)`.
    pub fn for_world(world_width: f32, section_width: f32) -> Self {
        assert!(section_width > 0.0, "section_width must be positive");
        let sections = (world_width / section_width).ceil() as SectionIndex;
        Self::new(section_width, sections - 1)
    }

    pub fn section_width(&self) -> f32 {
        self.section_width
    }

    pub fn max_section(&self) -> SectionIndex {
        self.max_section
    }

    /// Section containing `world_x`. May lie outside `[0, max_section]`.
    pub fn section_of(&self, world_x: f32) -> SectionIndex {
        (world_x / self.section_width).floor() as SectionIndex
    }

    /// Section containing `world_x`, clipped to the valid range.
    pub fn clamped_section_of(&self, world_x: f32) -> SectionIndex {
        self.clamp(self.section_of(world_x))
    }

    pub fn clamp(&self, section: SectionIndex) -> SectionIndex {
        section.clamp(0, self.max_section)
    }

    pub fn contains(&self, section: SectionIndex) -> bool {
        (0..=self.max_section).contains(&section)
    }

    /// All sections within `buffer` of `section`, clipped to `[0, max_section]`.
    pub fn window_around(&self, section: SectionIndex, buffer: i32) -> BTreeSet<SectionIndex> {
        let buffer = buffer.max(0);
        let lo = section.saturating_sub(buffer).max(0);
        let hi = section.saturating_add(buffer).min(self.max_section);
        (lo..=hi).collect()
    }

    /// World-x range `[start, end)` covered by `section`.
    pub fn world_range(&self, section: SectionIndex) -> Range<f32> {
        let start = section as f32 * self.section_width;
        start..start + self.section_width
    }

    /// Distance in sections between two indices.
    pub fn distance(a: SectionIndex, b: SectionIndex) -> i32 {
        (a - b).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_of_basic() {
        let grid = SectionGrid::new(640.0, 10);
        assert_eq!(grid.section_of(0.0), 0);
        assert_eq!(grid.section_of(639.9), 0);
        assert_eq!(grid.section_of(640.0), 1);
        assert_eq!(grid.section_of(-1.0), -1);
    }

    #[test]
    fn clamped_section_stays_in_range() {
        let grid = SectionGrid::new(640.0, 3);
        assert_eq!(grid.clamped_section_of(-50.0), 0);
        assert_eq!(grid.clamped_section_of(99_999.0), 3);
    }

    #[test]
    fn for_world_rounds_up() {
        let grid = SectionGrid::for_world(4096.0, 640.0);
        // 4096 / 640 = 6.4 -> 7 sections, last index 6
        assert_eq!(grid.max_section(), 6);

        let exact = SectionGrid::for_world(1280.0, 640.0);
        assert_eq!(exact.max_section(), 1);
    }

    #[test]
    fn window_is_clipped_at_both_ends() {
        let grid = SectionGrid::new(640.0, 5);
        assert_eq!(grid.window_around(0, 2), BTreeSet::from([0, 1, 2]));
        assert_eq!(grid.window_around(3, 2), BTreeSet::from([1, 2, 3, 4, 5]));
        assert_eq!(grid.window_around(5, 2), BTreeSet::from([3, 4, 5]));
    }

    #[test]
    fn window_with_zero_buffer_is_single_section() {
        let grid = SectionGrid::new(640.0, 5);
        assert_eq!(grid.window_around(2, 0), BTreeSet::from([2]));
    }

    #[test]
    fn world_range_is_half_open() {
        let grid = SectionGrid::new(640.0, 5);
        let range = grid.world_range(3);
        assert_eq!(range.start, 1920.0);
        assert_eq!(range.end, 2560.0);
        assert!(range.contains(&1920.0));
        assert!(!range.contains(&2560.0));
    }

    #[test]
    #[should_panic(expected = "section_width must be positive")]
    fn zero_width_panics() {
        let _ = SectionGrid::new(0.0, 1);
    }
}
