//! Random access over a forward-only source.
//!
//! Every item read from the source is kept, so the sequence can be rewound,
//! replayed and indexed without ever reading the source twice. Positions past
//! what has been read are reached by draining the source further, one item at
//! a time.

use std::fmt::Display;

use super::errors::IteratorError;
use crate::executor::RowCursor;

pub struct CachingIterator<S: RowCursor> {
    source: S,
    results: Vec<S::Item>,
    started: bool,
    exhausted: bool,
    /// `None` once iteration ran past the end, or before it started
    current_position: Option<usize>,
}

impl<S: RowCursor> CachingIterator<S> {
    pub fn new(source: S) -> Self {
        CachingIterator {
            source,
            results: Vec::new(),
            started: false,
            exhausted: false,
            current_position: None,
        }
    }

    /// Read from the source until `position` is cached. Returns whether it
    /// is, i.e. false when the source ran dry first.
    fn cache_through(&mut self, position: usize) -> Result<bool, IteratorError> {
        self.started = true;
        while self.results.len() <= position && !self.exhausted {
            match self.source.fetch_next()? {
                Some(item) => self.results.push(item),
                None => self.exhausted = true,
            }
        }
        Ok(position < self.results.len())
    }

    /// Move to position 0. Only the very first call reads from the source.
    pub fn rewind(&mut self) -> Result<(), IteratorError> {
        self.current_position = if self.cache_through(0)? { Some(0) } else { None };
        Ok(())
    }

    /// Move one position forward, reading from the source only when that
    /// position has not been seen yet. Starts iteration when called first.
    ///
    /// A failed read leaves the position where it was.
    pub fn move_next(&mut self) -> Result<(), IteratorError> {
        if !self.started {
            return self.rewind();
        }
        if let Some(position) = self.current_position {
            let next = position + 1;
            self.current_position = if self.cache_through(next)? { Some(next) } else { None };
        }
        Ok(())
    }

    pub fn current(&self) -> Option<&S::Item> {
        self.current_position.and_then(|p| self.results.get(p))
    }

    pub fn key(&self) -> Option<usize> {
        self.current_position
    }

    pub fn valid(&self) -> bool {
        self.current_position.is_some()
    }

    /// Item at `offset`, reading ahead as far as needed. The current
    /// position does not move.
    pub fn get<O>(&mut self, offset: O) -> Result<&S::Item, IteratorError>
    where
        O: TryInto<usize> + Copy + Display,
    {
        let invalid = || IteratorError::InvalidOffset {
            offset: offset.to_string(),
        };
        let position: usize = offset.try_into().map_err(|_| invalid())?;
        if !self.started {
            self.rewind()?;
        }
        if !self.cache_through(position)? {
            return Err(invalid());
        }
        self.results.get(position).ok_or_else(invalid)
    }

    /// Whether `offset` names an item. Invalid offsets are simply absent.
    pub fn offset_exists<O>(&mut self, offset: O) -> Result<bool, IteratorError>
    where
        O: TryInto<usize>,
    {
        let Ok(position) = TryInto::<usize>::try_into(offset) else {
            return Ok(false);
        };
        if !self.started {
            self.rewind()?;
        }
        self.cache_through(position)
    }

    pub fn set(&mut self, _offset: usize, _value: S::Item) -> Result<(), IteratorError> {
        Err(IteratorError::InvalidOperation(
            "query results are read-only".to_string(),
        ))
    }

    pub fn unset(&mut self, _offset: usize) -> Result<(), IteratorError> {
        Err(IteratorError::InvalidOperation(
            "query results are read-only".to_string(),
        ))
    }

    /// Size of the source, if it can tell without being drained.
    pub fn count(&self) -> Result<usize, IteratorError> {
        self.source.count().ok_or_else(|| {
            IteratorError::InvalidOperation("the underlying source cannot be counted".to_string())
        })
    }

    /// Number of items read from the source so far
    pub fn cached_len(&self) -> usize {
        self.results.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<S: RowCursor> CachingIterator<S>
where
    S::Item: Clone,
{
    /// Replay the sequence from the start. Cached items are served from
    /// memory and the source is read only past them.
    pub fn iter(&mut self) -> Iter<'_, S> {
        Iter {
            inner: self,
            position: 0,
            failed: false,
        }
    }

    /// Every item, draining the rest of the source.
    pub fn to_vec(&mut self) -> Result<Vec<S::Item>, IteratorError> {
        self.iter().collect()
    }
}

pub struct Iter<'a, S: RowCursor> {
    inner: &'a mut CachingIterator<S>,
    position: usize,
    failed: bool,
}

impl<S: RowCursor> Iterator for Iter<'_, S>
where
    S::Item: Clone,
{
    type Item = Result<S::Item, IteratorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.inner.cache_through(self.position) {
            Ok(true) => {
                let item = self.inner.results.get(self.position).cloned();
                self.position += 1;
                item.map(Ok)
            }
            Ok(false) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
