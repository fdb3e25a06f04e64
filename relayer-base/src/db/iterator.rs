use rocksdb::DBIterator;

use super::{DbError, DbResult};

/// Iterates raw key/value pairs under a prefix, stopping at the first key
/// outside of it
pub struct RawPrefixIterator<'a> {
    iter: DBIterator<'a>,
    prefix: &'a [u8],
    done: bool,
}

impl<'a> RawPrefixIterator<'a> {
    /// Wrap an iterator positioned at `prefix`
    pub fn new(iter: DBIterator<'a>, prefix: &'a [u8]) -> Self {
        Self {
            iter,
            prefix,
            done: false,
        }
    }
}

impl Iterator for RawPrefixIterator<'_> {
    type Item = DbResult<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.iter.next()? {
            Ok((key, value)) if key.starts_with(self.prefix) => {
                Some(Ok((key.into_vec(), value.into_vec())))
            }
            Ok(_) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(DbError::from(err)))
            }
        }
    }
}
