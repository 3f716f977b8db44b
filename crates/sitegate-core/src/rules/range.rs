use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A contiguous block of rule ids claimed by one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub owner: String,
    pub base: u32,
    pub count: u32,
}

impl IdRange {
    pub fn new(owner: impl Into<String>, base: u32, count: u32) -> Self {
        Self {
            owner: owner.into(),
            base,
            count,
        }
    }

    /// Check that every id of the range is representable.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::IdSpaceOverflow`] when the last id would
    /// exceed `u32::MAX`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() || self.last().is_some() {
            return Ok(());
        }
        Err(ValidationError::IdSpaceOverflow {
            owner: self.owner.clone(),
            base: self.base,
            count: self.count,
        })
    }

    /// Range covering `len` destinations, checked against the reserved range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::IdSpaceOverflow`] when the reserved range
    /// itself does not fit the id space, and
    /// [`ValidationError::RangeOverflow`] when `len` does not fit.
    pub fn owned_within(reserved: &IdRange, len: usize) -> Result<Self, ValidationError> {
        reserved.validate()?;
        if len > reserved.count as usize {
            return Err(ValidationError::RangeOverflow {
                owner: reserved.owner.clone(),
                count: len,
                capacity: reserved.count,
            });
        }
        Ok(Self::new(reserved.owner.clone(), reserved.base, len as u32))
    }

    fn last(&self) -> Option<u32> {
        self.count.checked_sub(1).and_then(|n| self.base.checked_add(n))
    }

    /// All representable ids in ascending order.
    pub fn ids(&self) -> Vec<u32> {
        (0..self.count).map_while(|i| self.base.checked_add(i)).collect()
    }

    pub fn contains(&self, id: u32) -> bool {
        id >= self.base && u64::from(id) < u64::from(self.base) + u64::from(self.count)
    }

    /// Id for the destination at `index`, if inside the range.
    pub fn id_for(&self, index: usize) -> Option<u32> {
        let index = u32::try_from(index).ok().filter(|i| *i < self.count)?;
        self.base.checked_add(index)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether every id of `other` is also in `self`.
    pub fn covers(&self, other: &IdRange) -> bool {
        if other.is_empty() {
            return true;
        }
        match other.last() {
            Some(last) => self.contains(other.base) && self.contains(last),
            None => false,
        }
    }
}

impl std::fmt::Display for IdRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "{}[]", self.owner);
        }
        let last = u64::from(self.base) + u64::from(self.count) - 1;
        write!(f, "{}[{}..={}]", self.owner, self.base, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_and_lookup() {
        let range = IdRange::new("sitegate", 1000, 3);
        assert_eq!(range.ids(), vec![1000, 1001, 1002]);
        assert!(range.contains(1002));
        assert!(!range.contains(1003));
        assert!(!range.contains(999));
        assert_eq!(range.id_for(1), Some(1001));
        assert_eq!(range.id_for(3), None);
    }

    #[test]
    fn test_empty_range() {
        let range = IdRange::new("sitegate", 1000, 0);
        assert!(range.is_empty());
        assert!(range.ids().is_empty());
        assert!(!range.contains(1000));
        assert_eq!(range.to_string(), "sitegate[]");
    }

    #[test]
    fn test_owned_within_reserved() {
        let reserved = IdRange::new("sitegate", 1000, 10);
        let owned = IdRange::owned_within(&reserved, 4).unwrap();
        assert_eq!(owned, IdRange::new("sitegate", 1000, 4));
        assert!(reserved.covers(&owned));
        assert_eq!(owned.to_string(), "sitegate[1000..=1003]");
    }

    #[test]
    fn test_owned_overflow_rejected() {
        let reserved = IdRange::new("sitegate", 1000, 2);
        let err = IdRange::owned_within(&reserved, 3).unwrap_err();
        assert_eq!(
            err,
            ValidationError::RangeOverflow {
                owner: "sitegate".into(),
                count: 3,
                capacity: 2,
            }
        );
    }

    #[test]
    fn test_reserved_range_past_id_space_rejected() {
        let reserved = IdRange::new("sitegate", u32::MAX, 1000);
        let err = IdRange::owned_within(&reserved, 1).unwrap_err();
        assert_eq!(
            err,
            ValidationError::IdSpaceOverflow {
                owner: "sitegate".into(),
                base: u32::MAX,
                count: 1000,
            }
        );
    }

    #[test]
    fn test_range_at_top_of_id_space_does_not_wrap() {
        let range = IdRange::new("sitegate", u32::MAX - 1, 4);
        assert_eq!(range.ids(), vec![u32::MAX - 1, u32::MAX]);
        assert!(range.contains(u32::MAX));
        assert!(!range.contains(0));
        assert_eq!(range.id_for(1), Some(u32::MAX));
        assert_eq!(range.id_for(2), None);
        assert!(!range.covers(&IdRange::new("sitegate", u32::MAX, 2)));
        assert_eq!(range.to_string(), "sitegate[4294967294..=4294967297]");
        assert!(range.validate().is_err());

        let top = IdRange::new("sitegate", u32::MAX - 1, 2);
        assert!(top.validate().is_ok());
        assert_eq!(top.ids(), vec![u32::MAX - 1, u32::MAX]);
    }

    #[test]
    fn test_covers_rejects_foreign_range() {
        let reserved = IdRange::new("sitegate", 1000, 10);
        assert!(!reserved.covers(&IdRange::new("other", 5, 2)));
        assert!(!reserved.covers(&IdRange::new("other", 1008, 5)));
    }
}
