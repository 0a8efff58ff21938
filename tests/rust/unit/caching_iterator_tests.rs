//! Unit tests for the caching iterator over in-memory cursors
//!
//! Covers the access-pattern guarantees: any mix of forward iteration,
//! rewinds and indexed reads walks the source exactly once.

#[cfg(test)]
mod caching_iterator_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use eagerql::executor::{ExecutorError, RowCursor, VecCursor};
    use eagerql::result_iterator::{CachingIterator, IteratorError};
    use test_case::test_case;

    /// Records every position handed out by the source
    struct TracingCursor {
        inner: VecCursor<i32>,
        handed_out: Rc<RefCell<Vec<i32>>>,
    }

    impl RowCursor for TracingCursor {
        type Item = i32;

        fn fetch_next(&mut self) -> Result<Option<i32>, ExecutorError> {
            let item = self.inner.fetch_next()?;
            if let Some(value) = item {
                self.handed_out.borrow_mut().push(value);
            }
            Ok(item)
        }
    }

    fn traced(len: i32) -> (CachingIterator<TracingCursor>, Rc<RefCell<Vec<i32>>>) {
        let handed_out = Rc::new(RefCell::new(Vec::new()));
        let cursor = TracingCursor {
            inner: VecCursor::new((1..=len).collect()),
            handed_out: Rc::clone(&handed_out),
        };
        (CachingIterator::new(cursor), handed_out)
    }

    fn forward(it: &mut CachingIterator<TracingCursor>, steps: usize) -> Vec<i32> {
        let mut seen = Vec::new();
        it.rewind().unwrap();
        for _ in 0..steps {
            match it.current() {
                Some(v) => seen.push(*v),
                None => break,
            }
            it.move_next().unwrap();
        }
        seen
    }

    /// Test that stepping to k equals seeking to k directly
    #[test_case(0; "first")]
    #[test_case(2; "middle")]
    #[test_case(4; "last")]
    fn test_stepping_matches_seeking(k: usize) {
        let (mut stepped, _) = traced(5);
        let walked = forward(&mut stepped, k + 1);

        let (mut seeked, _) = traced(5);
        assert_eq!(*seeked.get(k).unwrap(), walked[k]);
    }

    /// Test that no position is read from the source twice
    #[test]
    fn test_each_position_read_once_whatever_the_pattern() {
        let (mut it, handed_out) = traced(5);
        it.get(3).unwrap();
        it.get(1).unwrap();
        assert!(it.offset_exists(4usize).unwrap());
        forward(&mut it, 10);
        it.get(0).unwrap();
        forward(&mut it, 10);
        assert_eq!(*handed_out.borrow(), vec![1, 2, 3, 4, 5]);
    }

    /// Test the seek-ahead scenario on [1..5]
    #[test]
    fn test_get_three_before_iteration() {
        let (mut it, handed_out) = traced(5);
        assert_eq!(*it.get(3).unwrap(), 4);
        assert_eq!(*handed_out.borrow(), vec![1, 2, 3, 4]);
        assert_eq!(forward(&mut it, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(*handed_out.borrow(), vec![1, 2, 3, 4, 5]);
    }

    /// Test that an out-of-range read leaves the iterator usable
    #[test]
    fn test_out_of_range_then_full_iteration() {
        let (mut it, _) = traced(5);
        assert!(matches!(
            it.get(10),
            Err(IteratorError::InvalidOffset { .. })
        ));
        assert!(!it.offset_exists(10usize).unwrap());
        assert_eq!(forward(&mut it, 10), vec![1, 2, 3, 4, 5]);
    }

    /// Test reverse indexed reads against forward iteration
    #[test]
    fn test_reverse_gets_round_trip() {
        let (mut it, _) = traced(5);
        let forward_items = it.to_vec().unwrap();

        let (mut fresh, _) = traced(5);
        let mut by_position: Vec<(usize, i32)> = Vec::new();
        for i in (0..5usize).rev() {
            by_position.push((i, *fresh.get(i).unwrap()));
        }
        by_position.sort_by_key(|(i, _)| *i);
        let reversed: Vec<i32> = by_position.into_iter().map(|(_, v)| v).collect();
        assert_eq!(reversed, forward_items);
    }

    /// Test an empty source
    #[test]
    fn test_empty_source() {
        let (mut it, _) = traced(0);
        it.rewind().unwrap();
        assert!(!it.valid());
        assert_eq!(it.current(), None);
        it.move_next().unwrap();
        assert!(!it.valid());
        assert!(it.to_vec().unwrap().is_empty());
        assert!(matches!(it.get(0), Err(IteratorError::InvalidOffset { .. })));
    }

    /// Test the std iterator adapter
    #[test]
    fn test_iter_adapter() {
        let (mut it, _) = traced(3);
        let doubled: Vec<i32> = it.iter().map(|r| r.unwrap() * 2).collect();
        assert_eq!(doubled, vec![2, 4, 6]);
        assert_eq!(it.iter().count(), 3);
    }
}
