use std::hash::Hash;

/// An axis-aligned bounding box over an arbitrary number of dimensions.
///
/// `Region` defines a box in N-dimensional space using its minimum (`low`)
/// and maximum (`high`) corners. Regions are immutable value types: they are
/// created by callers or by the grid splitting algorithm and compared by
/// coordinate value, which makes them usable directly as map keys.
///
/// # Examples
///
/// ```rust
/// use gridcache::Region;
///
/// // A square region from (0,0) to (100,100)
/// let region = Region::new(&[0.0, 0.0], &[100.0, 100.0]);
///
/// let query = Region::new(&[50.0, 50.0], &[150.0, 150.0]);
/// assert!(region.intersects(&query));
/// ```
#[derive(Clone, PartialEq, Default, Debug, serde::Deserialize, serde::Serialize)]
pub struct Region {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl Eq for Region {}

impl Hash for Region {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for c in &self.low {
            c.to_bits().hash(state);
        }
        for c in &self.high {
            c.to_bits().hash(state);
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Region({:?}, {:?})", self.low, self.high)
    }
}

impl Region {
    /// Creates a new region from its low and high corners.
    ///
    /// # Panics
    ///
    /// Panics if the two corners do not have the same dimension.
    pub fn new(low: &[f64], high: &[f64]) -> Region {
        assert_eq!(
            low.len(),
            high.len(),
            "region corners must have the same dimension"
        );
        Region {
            low: low.to_vec(),
            high: high.to_vec(),
        }
    }

    /// Returns the number of dimensions of this region.
    pub fn dimension(&self) -> usize {
        self.low.len()
    }

    /// Returns the low coordinate on the given axis.
    pub fn low(&self, axis: usize) -> f64 {
        self.low[axis]
    }

    /// Returns the high coordinate on the given axis.
    pub fn high(&self, axis: usize) -> f64 {
        self.high[axis]
    }

    /// Returns the extent of this region along the given axis.
    pub fn extent(&self, axis: usize) -> f64 {
        self.high[axis] - self.low[axis]
    }

    /// Returns the area (product of all extents) of this region.
    pub fn area(&self) -> f64 {
        (0..self.dimension()).map(|a| self.extent(a)).product()
    }

    /// Checks if this region intersects another. Touching counts as
    /// intersection.
    pub fn intersects(&self, other: &Region) -> bool {
        self.dimension() == other.dimension()
            && (0..self.dimension())
                .all(|a| self.low[a] <= other.high[a] && self.high[a] >= other.low[a])
    }

    /// Checks if this region fully contains another.
    pub fn contains(&self, other: &Region) -> bool {
        self.dimension() == other.dimension()
            && (0..self.dimension())
                .all(|a| other.low[a] >= self.low[a] && other.high[a] <= self.high[a])
    }

    /// Returns the union of this region with another.
    ///
    /// # Panics
    ///
    /// Panics if the regions do not have the same dimension.
    pub fn union(&self, other: &Region) -> Region {
        assert_eq!(
            self.dimension(),
            other.dimension(),
            "regions must have the same dimension"
        );
        let low: Vec<f64> = (0..self.dimension())
            .map(|a| self.low[a].min(other.low[a]))
            .collect();
        let high: Vec<f64> = (0..self.dimension())
            .map(|a| self.high[a].max(other.high[a]))
            .collect();
        Region { low, high }
    }

    /// Returns the intersection of this region with another, if they
    /// intersect.
    pub fn intersection(&self, other: &Region) -> Option<Region> {
        if !self.intersects(other) {
            return None;
        }
        let low: Vec<f64> = (0..self.dimension())
            .map(|a| self.low[a].max(other.low[a]))
            .collect();
        let high: Vec<f64> = (0..self.dimension())
            .map(|a| self.high[a].min(other.high[a]))
            .collect();
        Some(Region { low, high })
    }

    /// Checks if this region is valid (low <= high on every axis).
    pub fn is_valid(&self) -> bool {
        (0..self.dimension()).all(|a| self.low[a] <= self.high[a])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new() {
        let region = Region::new(&[1.0, 2.0], &[3.0, 4.0]);
        assert_eq!(region.dimension(), 2);
        assert_eq!(region.low(0), 1.0);
        assert_eq!(region.low(1), 2.0);
        assert_eq!(region.high(0), 3.0);
        assert_eq!(region.high(1), 4.0);
    }

    #[test]
    #[should_panic]
    fn test_new_dimension_mismatch() {
        let _ = Region::new(&[1.0, 2.0], &[3.0]);
    }

    #[test]
    fn test_equality() {
        let r1 = Region::new(&[1.0, 2.0], &[3.0, 4.0]);
        let r2 = Region::new(&[1.0, 2.0], &[3.0, 4.0]);
        let r3 = Region::new(&[1.0, 2.0], &[3.0, 5.0]);

        assert_eq!(r1, r2);
        assert_ne!(r1, r3);
    }

    #[test]
    fn test_hash() {
        let r1 = Region::new(&[1.0, 2.0], &[3.0, 4.0]);
        let r2 = Region::new(&[1.0, 2.0], &[3.0, 4.0]);
        let r3 = Region::new(&[5.0, 6.0], &[7.0, 8.0]);

        let mut set = HashSet::new();
        set.insert(r1.clone());

        assert!(set.contains(&r2));
        assert!(!set.contains(&r3));
    }

    #[test]
    fn test_extent_and_area() {
        let region = Region::new(&[0.0, 0.0], &[10.0, 5.0]);
        assert_eq!(region.extent(0), 10.0);
        assert_eq!(region.extent(1), 5.0);
        assert_eq!(region.area(), 50.0);
    }

    #[test]
    fn test_area_3d() {
        let region = Region::new(&[0.0, 0.0, 0.0], &[10.0, 5.0, 2.0]);
        assert_eq!(region.dimension(), 3);
        assert_eq!(region.area(), 100.0);
    }

    #[test]
    fn test_intersects() {
        let r1 = Region::new(&[0.0, 0.0], &[10.0, 10.0]);
        let r2 = Region::new(&[5.0, 5.0], &[15.0, 15.0]);
        let r3 = Region::new(&[20.0, 20.0], &[30.0, 30.0]);
        let r4 = Region::new(&[10.0, 10.0], &[20.0, 20.0]); // Touches corner

        assert!(r1.intersects(&r2));
        assert!(r2.intersects(&r1));
        assert!(!r1.intersects(&r3));
        assert!(r1.intersects(&r4)); // Touching counts as intersection
    }

    #[test]
    fn test_intersects_3d() {
        let r1 = Region::new(&[0.0, 0.0, 0.0], &[10.0, 10.0, 10.0]);
        let r2 = Region::new(&[5.0, 5.0, 5.0], &[15.0, 15.0, 15.0]);
        let r3 = Region::new(&[5.0, 5.0, 20.0], &[15.0, 15.0, 30.0]);

        assert!(r1.intersects(&r2));
        // Disjoint on the third axis only
        assert!(!r1.intersects(&r3));
    }

    #[test]
    fn test_contains() {
        let outer = Region::new(&[0.0, 0.0], &[10.0, 10.0]);
        let inner = Region::new(&[2.0, 2.0], &[8.0, 8.0]);
        let partial = Region::new(&[5.0, 5.0], &[15.0, 15.0]);
        let outside = Region::new(&[20.0, 20.0], &[30.0, 30.0]);

        assert!(outer.contains(&inner));
        assert!(!outer.contains(&partial));
        assert!(!outer.contains(&outside));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&outer));
    }

    #[test]
    fn test_union() {
        let r1 = Region::new(&[0.0, 0.0], &[5.0, 5.0]);
        let r2 = Region::new(&[3.0, 3.0], &[10.0, 10.0]);

        let union = r1.union(&r2);
        assert_eq!(union, Region::new(&[0.0, 0.0], &[10.0, 10.0]));
    }

    #[test]
    fn test_intersection() {
        let r1 = Region::new(&[0.0, 0.0], &[10.0, 10.0]);
        let r2 = Region::new(&[5.0, 5.0], &[15.0, 15.0]);
        let r3 = Region::new(&[20.0, 20.0], &[30.0, 30.0]);

        let inter = r1.intersection(&r2);
        assert_eq!(inter, Some(Region::new(&[5.0, 5.0], &[10.0, 10.0])));
        assert!(r1.intersection(&r3).is_none());
    }

    #[test]
    fn test_is_valid() {
        let valid = Region::new(&[0.0, 0.0], &[10.0, 10.0]);
        let inverted = Region::new(&[10.0, 10.0], &[0.0, 0.0]);
        let point = Region::new(&[5.0, 5.0], &[5.0, 5.0]);

        assert!(valid.is_valid());
        assert!(!inverted.is_valid());
        assert!(point.is_valid());
    }

    #[test]
    fn test_negative_coordinates() {
        let region = Region::new(&[-10.0, -5.0], &[10.0, 5.0]);
        assert_eq!(region.extent(0), 20.0);
        assert_eq!(region.extent(1), 10.0);
        assert_eq!(region.area(), 200.0);
    }

    #[test]
    fn test_serialization() {
        let region = Region::new(&[1.5, 2.5], &[3.5, 4.5]);
        let json = serde_json::to_string(&region).unwrap();
        let deserialized: Region = serde_json::from_str(&json).unwrap();
        assert_eq!(region, deserialized);
    }

    #[test]
    fn test_display() {
        let region = Region::new(&[1.0, 2.0], &[3.0, 4.0]);
        let display = format!("{}", region);
        assert_eq!(display, "Region([1.0, 2.0], [3.0, 4.0])");
    }
}
