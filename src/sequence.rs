//! Finite, index-based sequence operations shared by indexable records.
//!
//! An implementor supplies `len`, `get` and `set`; every other operation is
//! built on those three. Mutating operations write through `set`, so the
//! element accessor validates every value written, and run inside
//! [IndexedSequence::atomic] so a rejected element leaves the sequence as it
//! was. Range arguments are clamped to the sequence length.

use std::{
    cmp::Ordering,
    ops::{Bound, Range, RangeBounds},
};

use crate::{errors::Result, value::Value};

pub trait IndexedSequence {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Result<Value>;

    fn set(&self, index: usize, value: Value) -> Result<()>;

    /// Runs a multi-element write. Implementors backed by bytes restore them
    /// when `f` fails; the default runs `f` as is.
    fn atomic<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R> {
        f()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Restartable iterator over the current element values.
    fn iter(&self) -> SequenceIter<'_, Self>
    where
        Self: Sized,
    {
        SequenceIter {
            seq: self,
            front: 0,
            back: self.len(),
        }
    }

    fn to_vec(&self) -> Result<Vec<Value>> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }

    fn map<T>(&self, mut f: impl FnMut(Value, usize) -> T) -> Result<Vec<T>> {
        (0..self.len()).map(|i| Ok(f(self.get(i)?, i))).collect()
    }

    fn filter(&self, mut f: impl FnMut(&Value, usize) -> bool) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        for i in 0..self.len() {
            let v = self.get(i)?;
            if f(&v, i) {
                out.push(v);
            }
        }
        Ok(out)
    }

    fn reduce<A>(&self, init: A, mut f: impl FnMut(A, Value, usize) -> A) -> Result<A> {
        let mut acc = init;
        for i in 0..self.len() {
            acc = f(acc, self.get(i)?, i);
        }
        Ok(acc)
    }

    fn find_index(&self, mut pred: impl FnMut(&Value, usize) -> bool) -> Result<Option<usize>> {
        for i in 0..self.len() {
            if pred(&self.get(i)?, i) {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    fn find(&self, mut pred: impl FnMut(&Value, usize) -> bool) -> Result<Option<Value>> {
        for i in 0..self.len() {
            let v = self.get(i)?;
            if pred(&v, i) {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    fn index_of(&self, needle: &Value) -> Result<Option<usize>> {
        self.find_index(|v, _| v == needle)
    }

    fn includes(&self, needle: &Value) -> Result<bool> {
        Ok(self.index_of(needle)?.is_some())
    }

    fn every(&self, mut pred: impl FnMut(&Value, usize) -> bool) -> Result<bool> {
        Ok(self.find_index(|v, i| !pred(v, i))?.is_none())
    }

    fn some(&self, pred: impl FnMut(&Value, usize) -> bool) -> Result<bool> {
        Ok(self.find_index(pred)?.is_some())
    }

    /// Copies the values of `range` out of the sequence.
    fn slice(&self, range: impl RangeBounds<usize>) -> Result<Vec<Value>> {
        clamp(range, self.len()).map(|i| self.get(i)).collect()
    }

    fn join(&self, separator: &str) -> Result<String> {
        let parts = self.map(|v, _| v.to_string())?;
        Ok(parts.join(separator))
    }

    /// Sorts in place by [Value::compare].
    fn sort(&self) -> Result<()> {
        self.sort_by(Value::compare)
    }

    fn sort_by(&self, cmp: impl FnMut(&Value, &Value) -> Ordering) -> Result<()> {
        let mut values = self.snapshot(0..self.len())?;
        values.sort_by(cmp);
        self.atomic(|| self.write_from(0, values))
    }

    fn reverse(&self) -> Result<()> {
        let mut values = self.snapshot(0..self.len())?;
        values.reverse();
        self.atomic(|| self.write_from(0, values))
    }

    /// Writes `value` to every index of `range`.
    fn fill(&self, value: Value, range: impl RangeBounds<usize>) -> Result<()> {
        let range = clamp(range, self.len());
        self.atomic(|| {
            for i in range {
                self.set(i, value.clone())?;
            }
            Ok(())
        })
    }

    /// Copies the elements of `source` to the indexes starting at `target`,
    /// truncated at the end of the sequence. Overlapping ranges are safe.
    fn copy_within(&self, target: usize, source: impl RangeBounds<usize>) -> Result<()> {
        let len = self.len();
        if target >= len {
            return Ok(());
        }
        let source = clamp(source, len);
        let count = source.len().min(len - target);
        let values = self.snapshot(source.start..source.start + count)?;
        self.atomic(|| self.write_from(target, values))
    }

    #[doc(hidden)]
    fn snapshot(&self, range: Range<usize>) -> Result<Vec<Value>> {
        range.map(|i| self.get(i).map(Value::snapshot)).collect()
    }

    #[doc(hidden)]
    fn write_from(&self, start: usize, values: Vec<Value>) -> Result<()> {
        for (i, v) in values.into_iter().enumerate() {
            self.set(start + i, v)?;
        }
        Ok(())
    }
}

/// Iterator over an [IndexedSequence]; yields one read result per element.
pub struct SequenceIter<'a, S> {
    seq: &'a S,
    front: usize,
    back: usize,
}

impl<S: IndexedSequence> Iterator for SequenceIter<'_, S> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.seq.get(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<S: IndexedSequence> DoubleEndedIterator for SequenceIter<'_, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.seq.get(self.back))
    }
}

impl<S: IndexedSequence> ExactSizeIterator for SequenceIter<'_, S> {}

fn clamp(range: impl RangeBounds<usize>, len: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(s) => *s,
        Bound::Excluded(s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(e) => e.saturating_add(1),
        Bound::Excluded(e) => *e,
        Bound::Unbounded => len,
    };
    let end = end.min(len);
    start.min(end)..end
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::errors::Error;

    /// In-memory sequence of bytes, validating like a uint8 accessor.
    struct Bytes(RefCell<Vec<u8>>);

    impl IndexedSequence for Bytes {
        fn len(&self) -> usize {
            self.0.borrow().len()
        }

        fn get(&self, index: usize) -> Result<Value> {
            Ok(Value::Int(self.0.borrow()[index] as i64))
        }

        fn set(&self, index: usize, value: Value) -> Result<()> {
            let v = value
                .as_i64()
                .filter(|v| (0..=255).contains(v))
                .ok_or_else(|| Error::range(&index.to_string(), "not a byte"))?;
            self.0.borrow_mut()[index] = v as u8;
            Ok(())
        }
    }

    /// Bytes that reject 0 on write and roll back failed multi-element writes.
    struct NonZero(RefCell<Vec<u8>>);

    impl IndexedSequence for NonZero {
        fn len(&self) -> usize {
            self.0.borrow().len()
        }

        fn get(&self, index: usize) -> Result<Value> {
            Ok(Value::Int(self.0.borrow()[index] as i64))
        }

        fn set(&self, index: usize, value: Value) -> Result<()> {
            let v = value
                .as_i64()
                .filter(|v| (1..=255).contains(v))
                .ok_or_else(|| Error::range(&index.to_string(), "not a non-zero byte"))?;
            self.0.borrow_mut()[index] = v as u8;
            Ok(())
        }

        fn atomic<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R> {
            let saved = self.0.borrow().clone();
            let result = f();
            if result.is_err() {
                *self.0.borrow_mut() = saved;
            }
            result
        }
    }

    fn bytes(v: &[u8]) -> Bytes {
        Bytes(RefCell::new(v.to_vec()))
    }

    fn ints(v: &[i64]) -> Vec<Value> {
        v.iter().map(|i| Value::Int(*i)).collect()
    }

    #[test]
    fn test_iter_is_restartable() {
        let seq = bytes(&[1, 2, 3]);
        let first: Vec<Value> = seq.iter().collect::<Result<_>>().unwrap();
        let second: Vec<Value> = seq.iter().collect::<Result<_>>().unwrap();
        assert_eq!(first, second);
        assert_eq!(seq.iter().len(), 3);
        assert_eq!(seq.iter().rev().next().unwrap().unwrap(), Value::Int(3));
    }

    #[test]
    fn test_queries() {
        let seq = bytes(&[5, 1, 4]);
        assert_eq!(seq.map(|v, _| v.as_i64().unwrap() * 2).unwrap(), vec![10, 2, 8]);
        assert_eq!(seq.filter(|v, _| v.as_i64() > Some(2)).unwrap(), ints(&[5, 4]));
        assert_eq!(seq.reduce(0, |a, v, _| a + v.as_i64().unwrap()).unwrap(), 10);
        assert_eq!(seq.find(|v, _| v.as_i64() < Some(5)).unwrap(), Some(Value::Int(1)));
        assert_eq!(seq.index_of(&Value::Int(4)).unwrap(), Some(2));
        assert!(!seq.includes(&Value::Int(9)).unwrap());
        assert!(seq.every(|v, _| v.as_i64() > Some(0)).unwrap());
        assert!(seq.some(|v, _| v.as_i64() == Some(4)).unwrap());
        assert_eq!(seq.join(",").unwrap(), "5,1,4");
    }

    #[test]
    fn test_slice_clamps() {
        let seq = bytes(&[1, 2, 3, 4]);
        assert_eq!(seq.slice(1..3).unwrap(), ints(&[2, 3]));
        assert_eq!(seq.slice(2..).unwrap(), ints(&[3, 4]));
        assert_eq!(seq.slice(3..10).unwrap(), ints(&[4]));
        assert_eq!(seq.slice(6..8).unwrap(), ints(&[]));
    }

    #[test]
    fn test_sort_and_reverse() {
        let seq = bytes(&[3, 1, 2]);
        seq.sort().unwrap();
        assert_eq!(*seq.0.borrow(), vec![1, 2, 3]);
        seq.reverse().unwrap();
        assert_eq!(*seq.0.borrow(), vec![3, 2, 1]);
        seq.sort_by(|a, b| b.compare(a)).unwrap();
        assert_eq!(*seq.0.borrow(), vec![3, 2, 1]);
    }

    #[test]
    fn test_fill() {
        let seq = bytes(&[0, 0, 0, 0]);
        seq.fill(Value::Int(7), 1..3).unwrap();
        assert_eq!(*seq.0.borrow(), vec![0, 7, 7, 0]);
        assert!(seq.fill(Value::Int(300), ..).is_err());
    }

    #[test]
    fn test_copy_within() {
        let seq = bytes(&[1, 2, 3, 4, 5]);
        seq.copy_within(0, 3..).unwrap();
        assert_eq!(*seq.0.borrow(), vec![4, 5, 3, 4, 5]);

        let seq = bytes(&[1, 2, 3, 4, 5]);
        seq.copy_within(1, 0..4).unwrap();
        assert_eq!(*seq.0.borrow(), vec![1, 1, 2, 3, 4]);

        let seq = bytes(&[1, 2, 3]);
        seq.copy_within(2, ..).unwrap();
        assert_eq!(*seq.0.borrow(), vec![1, 2, 1]);
    }

    #[test]
    fn test_rejected_write_rolls_back() {
        let seq = NonZero(RefCell::new(vec![0, 1, 2]));
        assert!(seq.reverse().is_err());
        assert_eq!(*seq.0.borrow(), vec![0, 1, 2]);

        assert!(seq.copy_within(1, 0..2).is_err());
        assert_eq!(*seq.0.borrow(), vec![0, 1, 2]);

        assert!(seq.sort_by(|a, b| b.compare(a)).is_err());
        assert_eq!(*seq.0.borrow(), vec![0, 1, 2]);
    }
}
