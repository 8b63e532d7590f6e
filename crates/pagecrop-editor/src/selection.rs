// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Selection synchronization across the three overlay views.
//
// Every "selection changed" event goes through `SelectionSync::selection_changed`,
// which updates the other views and reports what changed. Updating a view
// echoes a change event back into the reducer; the `syncing` guard drops those
// echoes so the views never feed back into each other.

use pagecrop_core::OverlayRect;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One of the rectangle-drawing surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// The single view: all-pages overlay or a previewed page.
    Primary,
    /// Odd-pages half of the split layout.
    Odd,
    /// Even-pages half of the split layout.
    Even,
}

/// A rectangle a view should now display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewUpdate {
    pub view: ViewKind,
    pub rect: Option<OverlayRect>,
}

/// Current selection of each view.
#[derive(Debug, Clone, Default)]
pub struct SelectionSync {
    primary: Option<OverlayRect>,
    odd: Option<OverlayRect>,
    even: Option<OverlayRect>,
    syncing: bool,
}

impl SelectionSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, view: ViewKind) -> Option<OverlayRect> {
        match view {
            ViewKind::Primary => self.primary,
            ViewKind::Odd => self.odd,
            ViewKind::Even => self.even,
        }
    }

    /// `view`'s selection was changed by the user to `rect`.
    ///
    /// Returns the updates the other views need. Zero-area rectangles are
    /// treated as a cleared selection.
    pub fn selection_changed(
        &mut self,
        view: ViewKind,
        rect: Option<OverlayRect>,
    ) -> Vec<ViewUpdate> {
        let rect = rect.filter(OverlayRect::is_valid);
        *self.slot(view) = rect;
        if self.syncing {
            return Vec::new();
        }

        self.syncing = true;
        let mut updates = Vec::new();
        match view {
            ViewKind::Primary => {
                self.set_view(ViewKind::Odd, rect, &mut updates);
                self.set_view(ViewKind::Even, rect, &mut updates);
            }
            ViewKind::Odd | ViewKind::Even => {
                let sibling = if view == ViewKind::Odd {
                    ViewKind::Even
                } else {
                    ViewKind::Odd
                };
                // The sibling keeps its position and takes the new size.
                let mirrored = match (self.get(sibling), rect) {
                    (Some(current), Some(rect)) => Some(current.with_size(rect.width, rect.height)),
                    (_, rect) => rect,
                };
                self.set_view(sibling, mirrored, &mut updates);
                self.set_view(ViewKind::Primary, rect, &mut updates);
            }
        }
        self.syncing = false;

        debug!(?view, updates = updates.len(), "Selection synchronized");
        updates
    }

    /// Programmatically set `view`'s selection, as if the user had drawn it.
    pub fn set_selection(&mut self, view: ViewKind, rect: Option<OverlayRect>) -> Vec<ViewUpdate> {
        let mut updates = Vec::new();
        let rect = rect.filter(OverlayRect::is_valid);
        if self.get(view) != rect {
            updates.push(ViewUpdate { view, rect });
        }
        updates.extend(self.selection_changed(view, rect));
        updates
    }

    /// Clear every view.
    pub fn clear(&mut self) -> Vec<ViewUpdate> {
        self.set_selection(ViewKind::Primary, None)
    }

    fn slot(&mut self, view: ViewKind) -> &mut Option<OverlayRect> {
        match view {
            ViewKind::Primary => &mut self.primary,
            ViewKind::Odd => &mut self.odd,
            ViewKind::Even => &mut self.even,
        }
    }

    /// Push `rect` into `view` and deliver the view's change echo.
    fn set_view(&mut self, view: ViewKind, rect: Option<OverlayRect>, updates: &mut Vec<ViewUpdate>) {
        if self.get(view) == rect {
            return;
        }
        updates.push(ViewUpdate { view, rect });
        let echoed = self.selection_changed(view, rect);
        debug_assert!(echoed.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Option<OverlayRect> {
        Some(OverlayRect::new(x, y, w, h))
    }

    #[test]
    fn primary_selection_copies_to_both_halves() {
        let mut sync = SelectionSync::new();
        let updates = sync.selection_changed(ViewKind::Primary, rect(1.0, 2.0, 30.0, 40.0));

        assert_eq!(updates.len(), 2);
        assert_eq!(sync.get(ViewKind::Odd), rect(1.0, 2.0, 30.0, 40.0));
        assert_eq!(sync.get(ViewKind::Even), rect(1.0, 2.0, 30.0, 40.0));
    }

    #[test]
    fn odd_update_resizes_even_in_place() {
        let mut sync = SelectionSync::new();
        sync.selection_changed(ViewKind::Even, rect(100.0, 100.0, 10.0, 10.0));
        sync.selection_changed(ViewKind::Odd, rect(5.0, 5.0, 50.0, 60.0));

        assert_eq!(sync.get(ViewKind::Even), rect(100.0, 100.0, 50.0, 60.0));
        assert_eq!(sync.get(ViewKind::Primary), rect(5.0, 5.0, 50.0, 60.0));
    }

    #[test]
    fn empty_sibling_receives_a_copy() {
        let mut sync = SelectionSync::new();
        sync.selection_changed(ViewKind::Even, rect(7.0, 8.0, 9.0, 10.0));
        assert_eq!(sync.get(ViewKind::Odd), rect(7.0, 8.0, 9.0, 10.0));
    }

    #[test]
    fn echoes_do_not_feed_back() {
        let mut sync = SelectionSync::new();
        sync.selection_changed(ViewKind::Primary, rect(0.0, 0.0, 10.0, 10.0));
        // Moving the odd rectangle must not snap it back via primary → odd.
        let updates = sync.selection_changed(ViewKind::Odd, rect(20.0, 20.0, 10.0, 10.0));

        assert_eq!(sync.get(ViewKind::Odd), rect(20.0, 20.0, 10.0, 10.0));
        assert_eq!(sync.get(ViewKind::Even), rect(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            updates,
            vec![ViewUpdate {
                view: ViewKind::Primary,
                rect: rect(20.0, 20.0, 10.0, 10.0),
            }]
        );
    }

    #[test]
    fn clearing_propagates() {
        let mut sync = SelectionSync::new();
        sync.selection_changed(ViewKind::Primary, rect(0.0, 0.0, 10.0, 10.0));
        let updates = sync.clear();
        assert_eq!(updates.len(), 3);
        for view in [ViewKind::Primary, ViewKind::Odd, ViewKind::Even] {
            assert_eq!(sync.get(view), None);
        }
    }

    #[test]
    fn zero_area_counts_as_cleared() {
        let mut sync = SelectionSync::new();
        sync.selection_changed(ViewKind::Odd, rect(0.0, 0.0, 0.0, 10.0));
        assert_eq!(sync.get(ViewKind::Odd), None);
        assert_eq!(sync.get(ViewKind::Primary), None);
    }
}
