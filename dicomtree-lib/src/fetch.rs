//! Incremental row fetching.
//!
//! Grows a node's known row count toward a requested limit as cheaply as
//! the cursor allows:
//!
//! 1. Seek straight to row `limit - 1`. If that row exists the node knows
//!    `limit` rows without scanning anything.
//! 2. Otherwise the result is shorter than the limit. Scan forward from the
//!    last known row until the cursor runs out; the count reached is exact
//!    and the node is settled.
//!
//! Growth is reported to an [`InsertionNotifier`] in a begin/end bracket. The
//! begin notification is delivered while the node still reports its old
//! count; the end notification after the new count is stored. The node stays
//! [`FetchState::Fetching`] until the end notification returns. The tree is
//! not borrowed while notifying, so a notified consumer may read from the tree
//! again, but a fetch it requests on the same node is rejected with
//! [`SkipReason::Busy`]. If it resets the tree instead, the fetch stops and
//! reports [`SkipReason::Reset`] without touching the new nodes.

use std::cell::RefCell;

use crate::backend::Cursor;
use crate::tree::FetchState;
use crate::tree::NodeId;
use crate::tree::Tree;

/// Why a fetch did not touch the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The limit was zero.
    ZeroLimit,
    /// The node is gone (the tree was reset).
    Missing,
    /// The exact row count is already known.
    Settled,
    /// The node already knows at least `limit` rows.
    Satisfied,
    /// Another fetch on this node is still running.
    Busy,
    /// The tree was reset while the fetch ran; its result was dropped.
    Reset,
}

/// Result of a fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchOutcome {
    /// Nothing was done.
    Skipped(SkipReason),
    /// The cursor was probed but the row count did not grow.
    Unchanged(usize),
    /// The row count grew and an insertion was reported.
    Grew {
        /// Row count before the fetch.
        from: usize,
        /// Row count after the fetch.
        to: usize,
    },
}

impl FetchOutcome {
    /// Returns the number of rows added by this fetch.
    pub fn added(&self) -> usize {
        match self {
            FetchOutcome::Grew { from, to } => to - from,
            _ => 0,
        }
    }
}

/// Receives the insertion bracket of a growing fetch.
pub(crate) trait InsertionNotifier {
    /// Rows `first..=last` are about to become known.
    fn begin_insert(&self, first: usize, last: usize);

    /// Rows `first..=last` are now known.
    fn end_insert(&self, first: usize, last: usize);
}

/// Outcome of probing a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Probe {
    pub(crate) count: usize,
    pub(crate) exhausted: bool,
}

/// Probes `cursor` for at least `limit` rows, `known` of which are already
/// known to exist. `limit` must be non-zero.
///
/// A missing cursor behaves like an empty result.
pub(crate) fn probe(cursor: Option<&mut (dyn Cursor + 'static)>, known: usize, limit: usize) -> Probe {
    let Some(cursor) = cursor else {
        return Probe {
            count: 0,
            exhausted: true,
        };
    };

    if cursor.seek(limit - 1) {
        return Probe {
            count: limit,
            exhausted: false,
        };
    }

    let mut count = known.max(1);
    if cursor.seek(count - 1) {
        while cursor.next() {
            count += 1;
        }
    } else {
        // empty or unreadable result
        count = 0;
    }
    Probe {
        count,
        exhausted: true,
    }
}

/// Grows node `id` toward `limit` known rows.
pub(crate) fn fetch(
    tree: &RefCell<Tree>,
    id: NodeId,
    limit: usize,
    notifier: &dyn InsertionNotifier,
) -> FetchOutcome {
    if limit == 0 {
        return FetchOutcome::Skipped(SkipReason::ZeroLimit);
    }

    let (generation, previous, probe) = {
        let mut tree = tree.borrow_mut();
        let generation = tree.generation();
        let Some(node) = tree.node_mut(id) else {
            return FetchOutcome::Skipped(SkipReason::Missing);
        };
        match node.state {
            FetchState::Settled => return FetchOutcome::Skipped(SkipReason::Settled),
            FetchState::Fetching => {
                log::debug!("rejected fetch on {:?}: already fetching", id);
                return FetchOutcome::Skipped(SkipReason::Busy);
            }
            FetchState::Idle => {}
        }
        if limit <= node.row_count {
            return FetchOutcome::Skipped(SkipReason::Satisfied);
        }

        node.state = FetchState::Fetching;
        let previous = node.row_count;
        (generation, previous, probe(node.cursor_mut(), previous, limit))
    };

    let next_state = if probe.exhausted {
        FetchState::Settled
    } else {
        FetchState::Idle
    };

    let reset = || {
        let reset = tree.borrow().generation() != generation;
        if reset {
            log::debug!("dropped fetch of {:?}: tree was reset", id);
        }
        reset
    };
    let update = |count: Option<usize>, state: FetchState| {
        if let Some(node) = tree.borrow_mut().node_mut(id) {
            if let Some(count) = count {
                node.row_count = count;
            }
            node.state = state;
        }
    };

    let outcome = if probe.count > previous {
        let last = probe.count - 1;
        notifier.begin_insert(previous, last);
        if reset() {
            return FetchOutcome::Skipped(SkipReason::Reset);
        }
        update(Some(probe.count), FetchState::Fetching);
        notifier.end_insert(previous, last);
        if reset() {
            return FetchOutcome::Skipped(SkipReason::Reset);
        }
        update(None, next_state);
        FetchOutcome::Grew {
            from: previous,
            to: probe.count,
        }
    } else {
        update(Some(probe.count), next_state);
        FetchOutcome::Unchanged(probe.count)
    };

    log::debug!(
        "fetch {:?} to {}: {:?}{}",
        id,
        limit,
        outcome,
        if probe.exhausted { " (settled)" } else { "" }
    );
    outcome
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::backend::MemoryExecutor;
    use crate::backend::VecCursor;
    use crate::model::Value;

    fn rows(n: usize) -> VecCursor {
        VecCursor::new(
            ["UID"],
            (0..n).map(|r| vec![Value::from(r as i64)]).collect(),
        )
    }

    fn probe_rows(n: usize, known: usize, limit: usize) -> Probe {
        let mut cursor: Box<dyn Cursor> = Box::new(rows(n));
        probe(Some(cursor.as_mut()), known, limit)
    }

    #[test]
    fn test_probe_cheap_seek() {
        assert_eq!(
            probe_rows(1000, 0, 256),
            Probe {
                count: 256,
                exhausted: false
            }
        );
    }

    #[test]
    fn test_probe_scans_short_result() {
        assert_eq!(
            probe_rows(10, 0, 256),
            Probe {
                count: 10,
                exhausted: true
            }
        );
        assert_eq!(
            probe_rows(300, 256, 512),
            Probe {
                count: 300,
                exhausted: true
            }
        );
    }

    #[test]
    fn test_probe_empty_and_missing() {
        let empty = Probe {
            count: 0,
            exhausted: true,
        };
        assert_eq!(probe_rows(0, 0, 256), empty);
        assert_eq!(probe(None, 0, 256), empty);
    }

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<(&'static str, usize, usize)>>,
    }

    impl InsertionNotifier for Recorder {
        fn begin_insert(&self, first: usize, last: usize) {
            self.events.borrow_mut().push(("begin", first, last));
        }

        fn end_insert(&self, first: usize, last: usize) {
            self.events.borrow_mut().push(("end", first, last));
        }
    }

    fn tree(n: usize) -> (RefCell<Tree>, NodeId) {
        let mut tree = Tree::new();
        tree.attach(Box::new(MemoryExecutor::new(move |_| Ok(rows(n)))));
        let root = tree.create_root();
        (RefCell::new(tree), root)
    }

    #[test]
    fn test_fetch_grows_then_settles() {
        let (tree, root) = tree(20);
        let recorder = Recorder::default();

        assert_eq!(
            fetch(&tree, root, 8, &recorder),
            FetchOutcome::Grew { from: 0, to: 8 }
        );
        assert_eq!(tree.borrow().node(root).unwrap().state(), FetchState::Idle);

        assert_eq!(
            fetch(&tree, root, 50, &recorder),
            FetchOutcome::Grew { from: 8, to: 20 }
        );
        assert!(tree.borrow().node(root).unwrap().is_settled());
        assert_eq!(
            *recorder.events.borrow(),
            vec![("begin", 0, 7), ("end", 0, 7), ("begin", 8, 19), ("end", 8, 19)]
        );

        assert_eq!(
            fetch(&tree, root, 100, &recorder),
            FetchOutcome::Skipped(SkipReason::Settled)
        );
    }

    #[test]
    fn test_fetch_short_circuits() {
        let (tree, root) = tree(20);
        let recorder = Recorder::default();

        assert_eq!(
            fetch(&tree, root, 0, &recorder),
            FetchOutcome::Skipped(SkipReason::ZeroLimit)
        );
        fetch(&tree, root, 5, &recorder);
        assert_eq!(
            fetch(&tree, root, 5, &recorder),
            FetchOutcome::Skipped(SkipReason::Satisfied)
        );

        tree.borrow_mut().node_mut(root).unwrap().state = FetchState::Fetching;
        assert_eq!(
            fetch(&tree, root, 10, &recorder),
            FetchOutcome::Skipped(SkipReason::Busy)
        );
        assert_eq!(tree.borrow().node(root).unwrap().row_count(), 5);
    }

    #[test]
    fn test_fetch_empty_result_settles_without_notification() {
        let (tree, root) = tree(0);
        let recorder = Recorder::default();
        assert_eq!(fetch(&tree, root, 256, &recorder), FetchOutcome::Unchanged(0));
        assert!(tree.borrow().node(root).unwrap().is_settled());
        assert!(recorder.events.borrow().is_empty());
    }

    struct Replacer<'a> {
        tree: &'a RefCell<Tree>,
        events: RefCell<Vec<&'static str>>,
    }

    impl InsertionNotifier for Replacer<'_> {
        fn begin_insert(&self, _first: usize, _last: usize) {
            self.events.borrow_mut().push("begin");
            let mut tree = self.tree.borrow_mut();
            tree.attach(Box::new(MemoryExecutor::new(|_| Ok(rows(2)))));
            tree.create_root();
        }

        fn end_insert(&self, _first: usize, _last: usize) {
            self.events.borrow_mut().push("end");
        }
    }

    #[test]
    fn test_fetch_drops_result_after_reset() {
        let (tree, root) = tree(50);
        let replacer = Replacer {
            tree: &tree,
            events: RefCell::new(Vec::new()),
        };

        assert_eq!(
            fetch(&tree, root, 10, &replacer),
            FetchOutcome::Skipped(SkipReason::Reset)
        );
        assert_eq!(*replacer.events.borrow(), vec!["begin"]);

        let tree = tree.borrow();
        let new_root = tree.root().unwrap();
        assert_eq!(new_root, root);
        let node = tree.node(new_root).unwrap();
        assert_eq!(node.row_count(), 0);
        assert_eq!(node.state(), FetchState::Idle);
    }
}
