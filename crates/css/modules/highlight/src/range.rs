//! Live ranges and the text runs they are tested against.
//! Spec: <https://dom.spec.whatwg.org/#concept-live-range>

use core::cmp::Ordering;
use dom::{BoundaryPoint, DocumentId, NodeKey, TreeMutation, TreeOrder};

/// A boundary pair that tracks tree mutations once its entry is registered
/// with a [`HighlightsMap`](crate::HighlightsMap).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LiveRange {
    pub document: DocumentId,
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl LiveRange {
    #[inline]
    pub const fn new(document: DocumentId, start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self {
            document,
            start,
            end,
        }
    }

    /// A range covering `[start, end)` of a single text node.
    #[inline]
    pub const fn in_text(document: DocumentId, node: NodeKey, start: u32, end: u32) -> Self {
        Self::new(
            document,
            BoundaryPoint::new(node, start),
            BoundaryPoint::new(node, end),
        )
    }

    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// The distinct nodes this range's boundaries sit in.
    pub(crate) fn boundary_nodes(&self) -> Vec<NodeKey> {
        if self.start.node == self.end.node {
            vec![self.start.node]
        } else {
            vec![self.start.node, self.end.node]
        }
    }

    /// Intersection test against a painted text run.
    ///
    /// A non-collapsed range `[s, e]` intersects run `[a, b]` iff `s < b` and
    /// `a < e`. A collapsed range at `p` only counts when `render_collapsed`
    /// is set, and then iff `a <= p <= b`. Ranges from another document, with
    /// points that cannot be ordered, or whose start is after their end never
    /// intersect.
    pub fn intersects_run<Order: TreeOrder + ?Sized>(
        &self,
        order: &Order,
        run: &TextRun,
        render_collapsed: bool,
    ) -> bool {
        if self.document != run.document {
            return false;
        }
        let run_start = run.start_point();
        let run_end = run.end_point();
        if self.is_collapsed() {
            return render_collapsed
                && is(order.compare_points(run_start, self.start), |ord| ord.is_le())
                && is(order.compare_points(self.start, run_end), |ord| ord.is_le());
        }
        is(order.compare_points(self.start, self.end), |ord| ord.is_lt())
            && is(order.compare_points(self.start, run_end), |ord| ord.is_lt())
            && is(order.compare_points(run_start, self.end), |ord| ord.is_lt())
    }

    /// Apply the live range update steps for one tree mutation.
    /// Returns true if either boundary moved.
    /// Spec: <https://dom.spec.whatwg.org/#concept-node-insert>,
    /// <https://dom.spec.whatwg.org/#concept-node-remove>,
    /// <https://dom.spec.whatwg.org/#concept-cd-replace>
    pub fn adjust_for(&mut self, mutation: &TreeMutation) -> bool {
        let start_moved = adjust_point(&mut self.start, mutation);
        let end_moved = adjust_point(&mut self.end, mutation);
        start_moved || end_moved
    }
}

fn is(order: Option<Ordering>, test: impl FnOnce(Ordering) -> bool) -> bool {
    order.is_some_and(test)
}

fn adjust_point(point: &mut BoundaryPoint, mutation: &TreeMutation) -> bool {
    match mutation {
        TreeMutation::ChildInserted { parent, index, .. } => {
            if point.node == *parent && point.offset > *index {
                point.offset = point.offset.saturating_add(1);
                return true;
            }
            false
        }
        TreeMutation::ChildRemoved {
            parent,
            index,
            subtree,
            ..
        } => {
            if subtree.contains(&point.node) {
                *point = BoundaryPoint::new(*parent, *index);
                return true;
            }
            if point.node == *parent && point.offset > *index {
                point.offset = point.offset.saturating_sub(1);
                return true;
            }
            false
        }
        TreeMutation::TextReplaced {
            node,
            offset,
            removed,
            inserted,
        } => {
            if point.node != *node || point.offset <= *offset {
                return false;
            }
            if point.offset <= offset.saturating_add(*removed) {
                point.offset = *offset;
            } else {
                point.offset = point
                    .offset
                    .saturating_add(*inserted)
                    .saturating_sub(*removed);
            }
            true
        }
        TreeMutation::AttributeChanged { .. } => false,
    }
}

/// The slice of one text node being painted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextRun {
    pub document: DocumentId,
    pub node: NodeKey,
    pub start: u32,
    pub end: u32,
}

impl TextRun {
    #[inline]
    pub const fn new(document: DocumentId, node: NodeKey, start: u32, end: u32) -> Self {
        Self {
            document,
            node,
            start,
            end,
        }
    }

    #[inline]
    pub const fn start_point(&self) -> BoundaryPoint {
        BoundaryPoint::new(self.node, self.start)
    }

    #[inline]
    pub const fn end_point(&self) -> BoundaryPoint {
        BoundaryPoint::new(self.node, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: DocumentId = DocumentId(1);
    const TEXT: NodeKey = NodeKey(7);
    const PARENT: NodeKey = NodeKey(3);

    /// Tree order for points inside one text node only.
    struct SingleNode;

    impl TreeOrder for SingleNode {
        fn compare_points(&self, left: BoundaryPoint, right: BoundaryPoint) -> Option<Ordering> {
            (left.node == TEXT && right.node == TEXT).then(|| left.offset.cmp(&right.offset))
        }
    }

    #[test]
    fn touching_ranges_do_not_intersect() {
        let run = TextRun::new(DOC, TEXT, 5, 10);
        assert!(!LiveRange::in_text(DOC, TEXT, 0, 5).intersects_run(&SingleNode, &run, false));
        assert!(LiveRange::in_text(DOC, TEXT, 0, 6).intersects_run(&SingleNode, &run, false));
        assert!(!LiveRange::in_text(DOC, TEXT, 10, 12).intersects_run(&SingleNode, &run, false));
    }

    #[test]
    fn collapsed_ranges_follow_the_policy_flag() {
        let run = TextRun::new(DOC, TEXT, 5, 10);
        let caret = LiveRange::in_text(DOC, TEXT, 10, 10);
        assert!(!caret.intersects_run(&SingleNode, &run, false));
        assert!(caret.intersects_run(&SingleNode, &run, true));
        let outside = LiveRange::in_text(DOC, TEXT, 11, 11);
        assert!(!outside.intersects_run(&SingleNode, &run, true));
    }

    #[test]
    fn inverted_and_foreign_ranges_never_intersect() {
        let run = TextRun::new(DOC, TEXT, 0, 10);
        assert!(!LiveRange::in_text(DOC, TEXT, 8, 2).intersects_run(&SingleNode, &run, true));
        assert!(
            !LiveRange::in_text(DocumentId(2), TEXT, 2, 8).intersects_run(&SingleNode, &run, true)
        );
    }

    #[test]
    fn text_replacement_clamps_and_shifts() {
        let mut range = LiveRange::in_text(DOC, TEXT, 3, 9);
        let moved = range.adjust_for(&TreeMutation::TextReplaced {
            node: TEXT,
            offset: 1,
            removed: 4,
            inserted: 1,
        });
        assert!(moved);
        assert_eq!((range.start.offset, range.end.offset), (1, 6));
    }

    #[test]
    fn removal_moves_points_out_of_the_subtree() {
        let mut range = LiveRange::new(
            DOC,
            BoundaryPoint::new(TEXT, 2),
            BoundaryPoint::new(PARENT, 4),
        );
        range.adjust_for(&TreeMutation::ChildRemoved {
            parent: PARENT,
            index: 1,
            node: TEXT,
            subtree: vec![TEXT],
        });
        assert_eq!(range.start, BoundaryPoint::new(PARENT, 1));
        assert_eq!(range.end, BoundaryPoint::new(PARENT, 3));
    }

    #[test]
    fn insertion_shifts_later_child_offsets_only() {
        let mut range = LiveRange::new(
            DOC,
            BoundaryPoint::new(PARENT, 1),
            BoundaryPoint::new(PARENT, 2),
        );
        range.adjust_for(&TreeMutation::ChildInserted {
            parent: PARENT,
            index: 1,
            node: NodeKey(40),
        });
        assert_eq!((range.start.offset, range.end.offset), (1, 3));
    }
}
