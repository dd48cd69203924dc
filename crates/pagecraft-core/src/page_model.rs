//! Page model for the organize flow
//!
//! Tracks order, rotation and keep state for every page of one loaded
//! document, and projects that state into the ordered list of pages an
//! export must copy.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PageCraftError, Result};

/// Quarter-turn page rotation, always one of 0, 90, 180 or 270 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// Normalize any multiple of 90 (negative included) into a rotation.
    pub fn from_degrees(degrees: i64) -> Option<Rotation> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::R0),
            90 => Some(Rotation::R90),
            180 => Some(Rotation::R180),
            270 => Some(Rotation::R270),
            _ => None,
        }
    }

    /// Rotate by `delta` degrees, modulo 360.
    ///
    /// # Panics
    ///
    /// Panics if `delta` is not a multiple of 90. Passing a quarter-turn
    /// multiple is the caller's responsibility.
    pub fn rotated_by(self, delta: i32) -> Rotation {
        let turned = i64::from(self.degrees()) + i64::from(delta);
        match Rotation::from_degrees(turned) {
            Some(rotation) => rotation,
            None => panic!("rotation delta must be a multiple of 90, got {delta}"),
        }
    }

    pub fn is_upright(self) -> bool {
        self == Rotation::R0
    }
}

impl TryFrom<i64> for Rotation {
    type Error = String;

    fn try_from(degrees: i64) -> std::result::Result<Self, Self::Error> {
        Rotation::from_degrees(degrees)
            .ok_or_else(|| format!("rotation must be a multiple of 90, got {degrees}"))
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> u16 {
        rotation.degrees()
    }
}

/// Direction for swapping an entry with its neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward the start of the list
    Up,
    /// Toward the end of the list
    Down,
}

impl Direction {
    fn neighbor(self, index: usize) -> Option<usize> {
        match self {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1),
        }
    }
}

/// Rotation/keep/order record for one working-set page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDescriptor {
    source_index: u32,
    pub rotation: Rotation,
    pub keep: bool,
}

impl PageDescriptor {
    fn new(source_index: u32) -> Self {
        Self {
            source_index,
            rotation: Rotation::R0,
            keep: true,
        }
    }

    /// Position of this page in the originally loaded document
    pub fn source_index(&self) -> u32 {
        self.source_index
    }
}

/// One export instruction: copy `source_index`, then apply `rotation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedPage {
    pub source_index: u32,
    pub rotation: Rotation,
}

/// Ordered page descriptors for the currently loaded document.
///
/// Mutators taking a position return `IndexOutOfRange` for positions
/// outside `[0, len)`, except [`PageModel::move_to`], which ignores them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageModel {
    pages: Vec<PageDescriptor>,
}

impl PageModel {
    pub fn new(page_count: u32) -> Self {
        let mut model = Self::default();
        model.load(page_count);
        model
    }

    /// Replace the model with `page_count` fresh descriptors.
    pub fn load(&mut self, page_count: u32) {
        self.pages = (0..page_count).map(PageDescriptor::new).collect();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[PageDescriptor] {
        &self.pages
    }

    pub fn get(&self, index: usize) -> Option<&PageDescriptor> {
        self.pages.get(index)
    }

    /// Swap the entry at `index` with its neighbor.
    ///
    /// Returns `Ok(false)` without changes when there is no neighbor in
    /// that direction.
    pub fn move_adjacent(&mut self, index: usize, direction: Direction) -> Result<bool> {
        self.check_index(index)?;
        match direction.neighbor(index).filter(|&n| n < self.pages.len()) {
            Some(neighbor) => {
                self.pages.swap(index, neighbor);
                debug!(index, neighbor, "swapped pages");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drag-drop reorder: remove the entry at `from` and reinsert it at `to`.
    ///
    /// Out-of-range positions and `from == to` leave the model unchanged
    /// and return `false`.
    pub fn move_to(&mut self, from: usize, to: usize) -> bool {
        let len = self.pages.len();
        if from == to || from >= len || to >= len {
            return false;
        }
        let page = self.pages.remove(from);
        self.pages.insert(to, page);
        debug!(from, to, "moved page");
        true
    }

    /// Rotate the entry at `index` by `delta` degrees and return its new rotation.
    ///
    /// # Panics
    ///
    /// Panics if `delta` is not a multiple of 90.
    pub fn rotate(&mut self, index: usize, delta: i32) -> Result<Rotation> {
        self.check_index(index)?;
        let page = &mut self.pages[index];
        page.rotation = page.rotation.rotated_by(delta);
        Ok(page.rotation)
    }

    /// Flip the keep flag of the entry at `index` and return the new value.
    pub fn toggle_keep(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        let page = &mut self.pages[index];
        page.keep = !page.keep;
        Ok(page.keep)
    }

    /// Kept pages in current order with their rotations.
    pub fn project(&self) -> Vec<ProjectedPage> {
        self.pages
            .iter()
            .filter(|page| page.keep)
            .map(|page| ProjectedPage {
                source_index: page.source_index,
                rotation: page.rotation,
            })
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.pages.len() {
            Ok(())
        } else {
            Err(PageCraftError::IndexOutOfRange {
                index,
                len: self.pages.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn order(model: &PageModel) -> Vec<u32> {
        model.pages().iter().map(|p| p.source_index()).collect()
    }

    #[test]
    fn test_load_creates_fresh_descriptors() {
        let model = PageModel::new(3);
        assert_eq!(order(&model), vec![0, 1, 2]);
        assert!(model
            .pages()
            .iter()
            .all(|p| p.keep && p.rotation == Rotation::R0));
    }

    #[test]
    fn test_load_replaces_previous_state() {
        let mut model = PageModel::new(4);
        model.rotate(0, 90).unwrap();
        model.toggle_keep(1).unwrap();
        model.load(2);
        assert_eq!(model, PageModel::new(2));
    }

    #[test]
    fn test_move_adjacent_swaps_neighbors() {
        let mut model = PageModel::new(3);
        assert!(model.move_adjacent(0, Direction::Down).unwrap());
        assert_eq!(order(&model), vec![1, 0, 2]);
        assert!(model.move_adjacent(2, Direction::Up).unwrap());
        assert_eq!(order(&model), vec![1, 2, 0]);
    }

    #[test]
    fn test_move_adjacent_at_edges_is_noop() {
        let mut model = PageModel::new(3);
        assert!(!model.move_adjacent(0, Direction::Up).unwrap());
        assert!(!model.move_adjacent(2, Direction::Down).unwrap());
        assert_eq!(order(&model), vec![0, 1, 2]);
    }

    #[test]
    fn test_move_adjacent_rejects_bad_index() {
        let mut model = PageModel::new(3);
        assert!(matches!(
            model.move_adjacent(3, Direction::Up),
            Err(PageCraftError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_move_to_reinserts() {
        let mut model = PageModel::new(5);
        assert!(model.move_to(0, 3));
        assert_eq!(order(&model), vec![1, 2, 3, 0, 4]);
        assert!(model.move_to(4, 0));
        assert_eq!(order(&model), vec![4, 1, 2, 3, 0]);
    }

    #[test]
    fn test_move_to_out_of_bounds_is_noop() {
        let mut model = PageModel::new(3);
        assert!(!model.move_to(0, 3));
        assert!(!model.move_to(7, 0));
        assert!(!model.move_to(1, 1));
        assert_eq!(order(&model), vec![0, 1, 2]);
    }

    #[test]
    fn test_rotate_wraps_both_ways() {
        let mut model = PageModel::new(1);
        assert_eq!(model.rotate(0, -90).unwrap(), Rotation::R270);
        assert_eq!(model.rotate(0, 180).unwrap(), Rotation::R90);
        assert_eq!(model.rotate(0, 270).unwrap(), Rotation::R0);
        assert_eq!(model.rotate(0, 720).unwrap(), Rotation::R0);
    }

    #[test]
    #[should_panic(expected = "multiple of 90")]
    fn test_rotate_rejects_partial_turns() {
        let mut model = PageModel::new(1);
        let _ = model.rotate(0, 45);
    }

    #[test]
    fn test_toggle_keep_leaves_order_and_rotation() {
        let mut model = PageModel::new(2);
        model.rotate(1, 90).unwrap();
        assert!(!model.toggle_keep(1).unwrap());
        let page = model.get(1).unwrap();
        assert_eq!(page.source_index(), 1);
        assert_eq!(page.rotation, Rotation::R90);
        assert!(model.toggle_keep(1).unwrap());
    }

    #[test]
    fn test_project_filters_and_keeps_order() {
        let mut model = PageModel::new(3);
        model.move_to(2, 0);
        model.rotate(0, 90).unwrap();
        model.toggle_keep(2).unwrap();
        assert_eq!(
            model.project(),
            vec![
                ProjectedPage {
                    source_index: 2,
                    rotation: Rotation::R90
                },
                ProjectedPage {
                    source_index: 0,
                    rotation: Rotation::R0
                },
            ]
        );
    }

    #[test]
    fn test_project_empty_when_all_removed() {
        let mut model = PageModel::new(3);
        for i in 0..3 {
            model.toggle_keep(i).unwrap();
        }
        assert!(model.project().is_empty());
    }

    #[test]
    fn test_rotation_serde_uses_degrees() {
        let json = serde_json::to_string(&Rotation::R270).unwrap();
        assert_eq!(json, "270");
        let parsed: Rotation = serde_json::from_str("-90").unwrap();
        assert_eq!(parsed, Rotation::R270);
        assert!(serde_json::from_str::<Rotation>("45").is_err());
    }
}
