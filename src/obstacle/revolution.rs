use crate::internals::LIDAR_MAX_RESOLUTION_SHIFT;
use log::trace;

/// Closest distance seen per angular bucket during the current revolution.
///
/// Buckets are `1 << resolution_shift` degrees wide. A bucket is only ever overwritten by a
/// strictly smaller distance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevolutionMap {
    resolution_shift: u8,
    buckets: Vec<Option<u32>>,
    populated: usize,
}

impl RevolutionMap {
    /// Creates an empty map. The shift is clamped to `LIDAR_MAX_RESOLUTION_SHIFT`.
    pub fn new(resolution_shift: u8) -> RevolutionMap {
        let resolution_shift = resolution_shift.min(LIDAR_MAX_RESOLUTION_SHIFT);
        let bucket_count = (359usize >> resolution_shift) + 1;
        RevolutionMap {
            resolution_shift,
            buckets: vec![None; bucket_count],
            populated: 0,
        }
    }

    /// Number of buckets in one revolution.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn resolution_shift(&self) -> u8 {
        self.resolution_shift
    }

    /// Bucket holding the whole-degree `angle`.
    #[inline]
    pub fn bucket_of(&self, angle: u16) -> usize {
        (angle as usize >> self.resolution_shift) % self.buckets.len()
    }

    /// Lowest and highest whole degree falling into `bucket`.
    pub fn bucket_degrees(&self, bucket: usize) -> (u16, u16) {
        let lo = bucket << self.resolution_shift;
        let hi = (((bucket + 1) << self.resolution_shift) - 1).min(359);
        (lo as u16, hi as u16)
    }

    /// Distance held by `bucket`, if any sample landed there this revolution.
    pub fn get(&self, bucket: usize) -> Option<u32> {
        self.buckets.get(bucket).copied().flatten()
    }

    /// `true` if the bucket already holds something strictly closer than `distance`.
    #[inline]
    pub fn has_closer(&self, bucket: usize, distance: u32) -> bool {
        matches!(self.get(bucket), Some(current) if current < distance)
    }

    /// Stores `distance` if the bucket is empty or holds something farther.
    /// Returns `true` if the bucket changed.
    pub fn record(&mut self, bucket: usize, distance: u32) -> bool {
        match self.buckets[bucket] {
            Some(current) if current <= distance => false,
            Some(_) => {
                self.buckets[bucket] = Some(distance);
                true
            }
            None => {
                self.buckets[bucket] = Some(distance);
                self.populated += 1;
                true
            }
        }
    }

    /// Number of populated buckets.
    #[inline]
    pub fn len(&self) -> usize {
        self.populated
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    pub fn clear(&mut self) {
        trace!("Clearing revolution map ({} buckets populated)", self.populated);
        self.buckets.iter_mut().for_each(|b| *b = None);
        self.populated = 0;
    }

    /// Returns the current contents and leaves an empty map in place.
    pub fn take(&mut self) -> RevolutionMap {
        let empty = RevolutionMap::new(self.resolution_shift);
        std::mem::replace(self, empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_keeps_minimum() {
        let mut map = RevolutionMap::new(2);
        let bucket = map.bucket_of(41);
        assert_eq!(bucket, 10);
        assert!(map.record(bucket, 900));
        assert!(!map.record(bucket, 1200));
        assert!(!map.record(bucket, 900));
        assert!(map.record(bucket, 300));
        assert_eq!(map.get(bucket), Some(300));
        assert_eq!(map.len(), 1);
        assert!(map.has_closer(bucket, 301));
        assert!(!map.has_closer(bucket, 300));
    }

    #[test]
    fn geometry_per_resolution() {
        assert_eq!(RevolutionMap::new(2).bucket_count(), 90);
        assert_eq!(RevolutionMap::new(0).bucket_count(), 360);
        let coarse = RevolutionMap::new(4);
        assert_eq!(coarse.bucket_count(), 23);
        assert_eq!(coarse.bucket_degrees(22), (352, 359));
        assert_eq!(RevolutionMap::new(2).bucket_degrees(1), (4, 7));

        let widest = RevolutionMap::new(30);
        assert_eq!(widest.resolution_shift(), 8);
        assert_eq!(widest.bucket_count(), 2);
        assert_eq!(widest.bucket_degrees(1), (256, 359));
        assert_eq!(widest.bucket_of(359), 1);
    }

    #[test]
    fn take_leaves_empty_map() {
        let mut map = RevolutionMap::new(2);
        map.record(3, 10);
        map.record(4, 20);
        let taken = map.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.get(4), Some(20));
        assert!(map.is_empty());
        assert_eq!(map.get(3), None);
    }
}
