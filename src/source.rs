//! Element sources
//!
//! A source is a single-pass, pull-based producer. Once `has_next` reports
//! `false` the source stays exhausted.

use crate::error::{StreamError, StreamResult};

/// Pull-based producer of stream elements. May be finite or infinite.
pub trait Source<T>: Send {
    /// Whether another element is available. Repeatable, never consumes.
    fn has_next(&mut self) -> bool;

    /// Produce the next element, failing with `NoNextElement` when exhausted.
    fn next(&mut self) -> StreamResult<T>;
}

impl<T, S> Source<T> for Box<S>
where
    S: Source<T> + ?Sized,
{
    fn has_next(&mut self) -> bool {
        (**self).has_next()
    }

    fn next(&mut self) -> StreamResult<T> {
        (**self).next()
    }
}

/// Source backed by a closure that supplies the whole backing data.
///
/// The supplier runs on the first `has_next`/`next` call, so edits made to
/// the captured data before the first pull are visible.
pub struct SupplierSource<T> {
    supplier: Option<Box<dyn FnOnce() -> Vec<T> + Send>>,
    data: Option<std::vec::IntoIter<T>>,
}

impl<T: Send> SupplierSource<T> {
    pub fn new<F>(supplier: F) -> Self
    where
        F: FnOnce() -> Vec<T> + Send + 'static,
    {
        Self {
            supplier: Some(Box::new(supplier)),
            data: None,
        }
    }

    fn materialize(&mut self) -> &mut std::vec::IntoIter<T> {
        if self.data.is_none() {
            let data = self.supplier.take().map(|f| f()).unwrap_or_default();
            self.data = Some(data.into_iter());
        }
        self.data.get_or_insert_with(|| Vec::new().into_iter())
    }

    /// Whether the supplier has run.
    pub fn is_materialized(&self) -> bool {
        self.data.is_some()
    }
}

impl<T: Send> Source<T> for SupplierSource<T> {
    fn has_next(&mut self) -> bool {
        self.materialize().len() > 0
    }

    fn next(&mut self) -> StreamResult<T> {
        self.materialize().next().ok_or(StreamError::NoNextElement)
    }
}

/// Source wrapping a native iterator with a one-element look-ahead.
pub struct IterSource<I: Iterator> {
    iter: I,
    peeked: Option<I::Item>,
}

impl<I: Iterator> IterSource<I> {
    pub fn new(iter: I) -> Self {
        Self { iter, peeked: None }
    }
}

impl<I> Source<I::Item> for IterSource<I>
where
    I: Iterator + Send,
    I::Item: Send,
{
    fn has_next(&mut self) -> bool {
        if self.peeked.is_none() {
            self.peeked = self.iter.next();
        }
        self.peeked.is_some()
    }

    fn next(&mut self) -> StreamResult<I::Item> {
        match self.peeked.take() {
            Some(item) => Ok(item),
            None => self.iter.next().ok_or(StreamError::NoNextElement),
        }
    }
}

/// Source built from a user supplied `next`/`has_next` pair.
///
/// `has_next` must be side-effect free. The pair may describe an infinite
/// source, in which case only sequential streams with a `limit` terminate.
pub struct FnSource<T> {
    next: Box<dyn FnMut() -> T + Send>,
    has_next: Box<dyn FnMut() -> bool + Send>,
}

impl<T> FnSource<T> {
    pub fn new<N, H>(next: N, has_next: H) -> Self
    where
        N: FnMut() -> T + Send + 'static,
        H: FnMut() -> bool + Send + 'static,
    {
        Self {
            next: Box::new(next),
            has_next: Box::new(has_next),
        }
    }
}

impl<T> Source<T> for FnSource<T> {
    fn has_next(&mut self) -> bool {
        (self.has_next)()
    }

    fn next(&mut self) -> StreamResult<T> {
        if !(self.has_next)() {
            return Err(StreamError::NoNextElement);
        }
        Ok((self.next)())
    }
}

/// Pull every remaining element of a finite source into memory.
pub fn drain<T, S>(source: &mut S) -> StreamResult<Vec<T>>
where
    S: Source<T> + ?Sized,
{
    let mut data = Vec::new();
    while source.has_next() {
        data.push(source.next()?);
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn supplier_is_deferred_until_first_pull() {
        let backing = Arc::new(Mutex::new(vec![1, 2, 3]));
        let captured = backing.clone();
        let mut source = SupplierSource::new(move || captured.lock().unwrap().clone());
        assert!(!source.is_materialized());

        backing.lock().unwrap().push(4);

        assert_eq!(drain(&mut source).unwrap(), vec![1, 2, 3, 4]);
        assert!(source.is_materialized());
    }

    #[test]
    fn exhausted_source_reports_no_next_element() {
        let mut source = SupplierSource::new(|| vec![7]);
        assert_eq!(source.next(), Ok(7));
        assert!(!source.has_next());
        assert_eq!(source.next(), Err(StreamError::NoNextElement));
        assert!(!source.has_next());
    }

    #[test]
    fn iter_source_has_next_is_repeatable() {
        let mut source = IterSource::new(vec!["a", "b"].into_iter());
        assert!(source.has_next());
        assert!(source.has_next());
        assert_eq!(source.next(), Ok("a"));
        assert_eq!(source.next(), Ok("b"));
        assert!(!source.has_next());
        assert_eq!(source.next(), Err(StreamError::NoNextElement));
    }

    #[test]
    fn fn_source_counts_up_to_bound() {
        let mut i = 0;
        let bound = Arc::new(Mutex::new(0));
        let seen = bound.clone();
        let mut source = FnSource::new(
            move || {
                i += 1;
                *seen.lock().unwrap() = i;
                i
            },
            {
                let bound = bound.clone();
                move || *bound.lock().unwrap() < 3
            },
        );
        assert_eq!(drain(&mut source).unwrap(), vec![1, 2, 3]);
        assert_eq!(source.next(), Err(StreamError::NoNextElement));
    }
}
