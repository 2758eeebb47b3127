/// Highlighted row within the displayed results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Nothing displayed, nothing selectable.
    Empty,
    HasRows(Highlight),
}

/// A row index paired with the number of displayed rows.
///
/// Only built through [`Selection::for_rows`], so `shown >= 1` and
/// `index < shown` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    index: usize,
    shown: usize,
}

impl Selection {
    /// Fresh selection for `shown` displayed rows, highlighting the first.
    pub fn for_rows(shown: usize) -> Self {
        if shown == 0 {
            Self::Empty
        } else {
            Self::HasRows(Highlight { index: 0, shown })
        }
    }

    pub fn index(self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::HasRows(row) => Some(row.index),
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::HasRows(Highlight { index, shown }) => Self::HasRows(Highlight {
                index: (index + 1) % shown,
                shown,
            }),
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::HasRows(Highlight { index, shown }) => Self::HasRows(Highlight {
                index: index.checked_sub(1).unwrap_or(shown - 1),
                shown,
            }),
        }
    }

    /// Jump to `row` if it is displayed.
    pub fn select(self, row: usize) -> Self {
        match self {
            Self::HasRows(Highlight { shown, .. }) if row < shown => {
                Self::HasRows(Highlight { index: row, shown })
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Next,
        Prev,
    }

    fn arb_steps() -> impl Strategy<Value = Vec<Step>> {
        prop::collection::vec(prop_oneof![Just(Step::Next), Just(Step::Prev)], 0..40)
    }

    fn shown(selection: Selection) -> Option<usize> {
        match selection {
            Selection::Empty => None,
            Selection::HasRows(row) => Some(row.shown),
        }
    }

    #[test]
    fn no_rows_is_empty() {
        assert_eq!(Selection::for_rows(0), Selection::Empty);
        assert_eq!(Selection::Empty.next(), Selection::Empty);
        assert_eq!(Selection::Empty.prev(), Selection::Empty);
        assert_eq!(Selection::Empty.index(), None);
    }

    #[test]
    fn down_wraps_from_last_to_first() {
        let selection = Selection::for_rows(3).select(2);

        assert_eq!(selection.next().index(), Some(0));
    }

    #[test]
    fn up_wraps_from_first_to_last() {
        let selection = Selection::for_rows(3);

        assert_eq!(selection.prev().index(), Some(2));
    }

    #[test]
    fn single_row_stays_put() {
        let selection = Selection::for_rows(1);

        assert_eq!(selection.next().index(), Some(0));
        assert_eq!(selection.prev().index(), Some(0));
    }

    #[test]
    fn moves_step_by_one_inside_range() {
        let selection = Selection::for_rows(5).next().next();
        assert_eq!(selection.index(), Some(2));
        assert_eq!(selection.prev().index(), Some(1));
    }

    #[test]
    fn select_ignores_hidden_rows() {
        let selection = Selection::for_rows(2);

        assert_eq!(selection.select(1).index(), Some(1));
        assert_eq!(selection.select(4).index(), Some(0));
        assert_eq!(Selection::Empty.select(0), Selection::Empty);
    }

    proptest! {
        /// Any walk of next/prev keeps the highlight on a displayed row.
        #[test]
        fn prop_moves_stay_in_range(rows in 1usize..=5, steps in arb_steps()) {
            let mut selection = Selection::for_rows(rows);

            for step in steps {
                selection = match step {
                    Step::Next => selection.next(),
                    Step::Prev => selection.prev(),
                };
                let index = selection.index();
                prop_assert!(index.is_some_and(|idx| idx < rows));
                prop_assert_eq!(shown(selection), Some(rows));
            }
        }

        /// `next` then `prev` returns to the same row, and `rows` nexts are a full lap.
        #[test]
        fn prop_next_and_prev_are_inverse(rows in 1usize..=5, start in 0usize..5) {
            let selection = Selection::for_rows(rows).select(start % rows);

            prop_assert_eq!(selection.next().prev(), selection);
            prop_assert_eq!(selection.prev().next(), selection);

            let lap = (0..rows).fold(selection, |sel, _| sel.next());
            prop_assert_eq!(lap, selection);
        }
    }
}
