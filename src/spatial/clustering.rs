use std::sync::Arc;

use crate::{
    core::{constants::CLUSTER_GRID_FACTOR, geo::Point},
    layers::marker::Marker,
    prelude::HashMap,
};

/// A group of markers that are drawn as one element
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Mean position of the members, in world pixels
    pub center: Point,
    /// Smallest radius around `center` containing every member footprint
    pub radius: f64,
    /// Cluster tag shared by the members (`None` for untagged singletons)
    pub tag: Option<String>,
    pub members: Vec<Arc<Marker>>,
}

impl Cluster {
    /// Get the number of items in the cluster
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Check if this is a single-item cluster
    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }
}

type BucketKey<'a> = (&'a str, i64, i64);

struct ClusterRecord<'a> {
    tag: Option<&'a str>,
    bucket: (i64, i64),
    sum: Point,
    items: Vec<(Point, &'a Arc<Marker>)>,
}

impl ClusterRecord<'_> {
    fn center(&self) -> Point {
        self.sum.multiply(1.0 / self.items.len() as f64)
    }
}

/// Grid based marker clustering.
///
/// One instance covers a single clustering pass: markers are added in caller
/// order, clusters are read back, and the whole arena is dropped. Nothing is
/// carried over between passes.
pub struct Clustering<'a> {
    grid_factor: f64,
    records: Vec<ClusterRecord<'a>>,
    buckets: HashMap<BucketKey<'a>, Vec<usize>>,
}

impl<'a> Clustering<'a> {
    pub fn new(grid_factor: f64) -> Self {
        Self {
            grid_factor,
            records: Vec::new(),
            buckets: HashMap::default(),
        }
    }

    fn bucket_of(&self, point: Point) -> (i64, i64) {
        (
            (point.x / self.grid_factor).floor() as i64,
            (point.y / self.grid_factor).floor() as i64,
        )
    }

    /// Add a marker projected at `position` (world pixels).
    ///
    /// Tagged markers look for a same-tag cluster in a square of buckets whose
    /// reach grows with the marker's own size; the first bucket hit in
    /// row-major order wins.
    pub fn add(&mut self, position: Point, marker: &'a Arc<Marker>) {
        let (bx, by) = self.bucket_of(position);
        let tag = marker.cluster.as_deref();

        let matched = tag.and_then(|tag| self.find_near(tag, (bx, by), marker.size));

        match (matched, tag) {
            (Some(id), Some(tag)) => {
                let record = &mut self.records[id];
                record.items.push((position, marker));
                record.sum = record.sum.add(&position);

                let old_bucket = record.bucket;
                let new_bucket = self.bucket_of(self.records[id].center());
                if new_bucket != old_bucket {
                    self.records[id].bucket = new_bucket;
                    self.unlink(tag, old_bucket, id);
                    self.buckets
                        .entry((tag, new_bucket.0, new_bucket.1))
                        .or_default()
                        .push(id);
                }
            }
            _ => {
                let id = self.records.len();
                self.records.push(ClusterRecord {
                    tag,
                    bucket: (bx, by),
                    sum: position,
                    items: vec![(position, marker)],
                });
                if let Some(tag) = tag {
                    self.buckets.entry((tag, bx, by)).or_default().push(id);
                }
            }
        }
    }

    /// First same-tag cluster in row-major order within the search square of
    /// a marker of `size` sitting in `bucket`.
    ///
    /// Large markers would make the square huge, so once it holds more cells
    /// than there are occupied buckets those are scanned instead.
    fn find_near(&self, tag: &str, bucket: (i64, i64), size: f64) -> Option<usize> {
        let (bx, by) = bucket;
        let reach = (size / self.grid_factor / 3.0).ceil().max(0.0);
        let cells = (2.0 * reach + 1.0).powi(2);

        if cells <= self.buckets.len() as f64 {
            let reach = reach as i64;
            return (-reach..=reach)
                .flat_map(|dy| (-reach..=reach).map(move |dx| (bx + dx, by + dy)))
                .find_map(|(x, y)| self.buckets.get(&(tag, x, y))?.first().copied());
        }

        let reach = reach as u64;
        self.buckets
            .iter()
            .filter(|((other, x, y), _)| {
                *other == tag && x.abs_diff(bx) <= reach && y.abs_diff(by) <= reach
            })
            .min_by_key(|((_, x, y), _)| (*y, *x))
            .and_then(|(_, ids)| ids.first().copied())
    }

    fn unlink(&mut self, tag: &'a str, bucket: (i64, i64), id: usize) {
        let key = (tag, bucket.0, bucket.1);
        if let Some(ids) = self.buckets.get_mut(&key) {
            ids.retain(|&other| other != id);
            if ids.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    /// Clusters in creation order
    pub fn clusters(&self) -> Vec<Cluster> {
        self.records
            .iter()
            .map(|record| {
                let center = record.center();
                let radius = record
                    .items
                    .iter()
                    .map(|(pos, marker)| center.distance_to(pos) + marker.size)
                    .fold(0.0, f64::max);

                Cluster {
                    center,
                    radius,
                    tag: record.tag.map(str::to_owned),
                    members: record.items.iter().map(|(_, m)| Arc::clone(m)).collect(),
                }
            })
            .collect()
    }
}

impl Default for Clustering<'_> {
    fn default() -> Self {
        Self::new(CLUSTER_GRID_FACTOR)
    }
}

/// Run a complete clustering pass over already projected markers.
pub fn cluster_markers<'a, I>(grid_factor: f64, items: I) -> Vec<Cluster>
where
    I: IntoIterator<Item = (Point, &'a Arc<Marker>)>,
{
    let mut grid = Clustering::new(grid_factor);
    for (position, marker) in items {
        grid.add(position, marker);
    }
    grid.clusters()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::marker::Color;

    fn tagged(tag: &str, size: f64) -> Arc<Marker> {
        Arc::new(Marker::circle(0.0, 0.0, size, Color::GRAY).with_cluster(tag))
    }

    #[test]
    fn test_nearby_same_tag_markers_merge() {
        let a = tagged("a", 12.0);
        let b = tagged("a", 12.0);
        let clusters = cluster_markers(
            8.0,
            [(Point::new(1000.0, 500.0), &a), (Point::new(1002.0, 500.0), &b)],
        );

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count(), 2);
        assert_eq!(clusters[0].center, Point::new(1001.0, 500.0));
        assert!((clusters[0].radius - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_distant_markers_stay_apart() {
        let a = tagged("a", 12.0);
        let b = tagged("a", 12.0);
        let clusters = cluster_markers(
            8.0,
            [(Point::new(1000.0, 500.0), &a), (Point::new(11000.0, 500.0), &b)],
        );

        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(Cluster::is_single));
    }

    #[test]
    fn test_tags_and_untagged_markers_never_merge() {
        let a = tagged("a", 12.0);
        let b = tagged("b", 12.0);
        let plain1 = Arc::new(Marker::circle(0.0, 0.0, 12.0, Color::GRAY));
        let plain2 = Arc::new(Marker::circle(0.0, 0.0, 12.0, Color::GRAY));
        let p = Point::new(40.0, 40.0);

        let clusters = cluster_markers(8.0, [(p, &a), (p, &b), (p, &plain1), (p, &plain2)]);
        assert_eq!(clusters.len(), 4);
        assert_eq!(clusters[2].tag, None);
    }

    #[test]
    fn test_search_reach_scales_with_marker_size() {
        let anchor = tagged("a", 6.0);
        let small = tagged("a", 6.0);
        let large = tagged("a", 48.0);

        // Two buckets away: a 6px marker only scans one bucket around itself
        let apart = cluster_markers(
            8.0,
            [(Point::new(4.0, 4.0), &anchor), (Point::new(20.0, 4.0), &small)],
        );
        assert_eq!(apart.len(), 2);

        let merged = cluster_markers(
            8.0,
            [(Point::new(4.0, 4.0), &anchor), (Point::new(20.0, 4.0), &large)],
        );
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_huge_marker_scans_occupied_buckets() {
        let right = tagged("a", 6.0);
        let above = tagged("a", 6.0);
        let other_tag = tagged("b", 6.0);
        let huge = tagged("a", 1e12);

        // Far apart, and too small to reach each other
        let mut grid = Clustering::new(8.0);
        grid.add(Point::new(800.0, 0.0), &right);
        grid.add(Point::new(0.0, -80.0), &above);
        grid.add(Point::new(-400.0, -400.0), &other_tag);
        assert_eq!(grid.clusters().len(), 3);

        // Reaches everything; the top-most row wins like in the grid walk
        grid.add(Point::new(0.0, 0.0), &huge);
        let clusters = grid.clusters();
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].count(), 1);
        assert_eq!(clusters[1].count(), 2);
        assert!(Arc::ptr_eq(&clusters[1].members[1], &huge));
        assert_eq!(clusters[2].count(), 1);
    }

    #[test]
    fn test_centroid_rekeys_bucket() {
        let markers: Vec<_> = (0..3).map(|_| tagged("a", 30.0)).collect();
        let mut grid = Clustering::new(8.0);
        grid.add(Point::new(0.0, 0.0), &markers[0]);
        grid.add(Point::new(16.0, 0.0), &markers[1]);
        // Centroid moved to x = 8 (bucket 1); bucket 0 is out of reach from
        // bucket 3, so this only merges through the re-keyed entry
        grid.add(Point::new(24.0, 0.0), &markers[2]);

        let clusters = grid.clusters();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count(), 3);
        assert!((clusters[0].center.x - 40.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_and_contains_members() {
        let markers: Vec<_> = (0..60)
            .map(|i| tagged(if i % 3 == 0 { "a" } else { "b" }, 4.0 + (i % 7) as f64 * 3.0))
            .collect();
        let positions: Vec<_> = (0..60)
            .map(|i| Point::new((i * 37 % 200) as f64, (i * 53 % 150) as f64))
            .collect();

        let run = || cluster_markers(8.0, positions.iter().copied().zip(markers.iter()));
        let first = run();
        let second = run();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.center, b.center);
            assert_eq!(a.radius, b.radius);
            assert_eq!(a.count(), b.count());
        }

        let total: usize = first.iter().map(Cluster::count).sum();
        assert_eq!(total, 60);

        for cluster in &first {
            for member in &cluster.members {
                let idx = markers.iter().position(|m| Arc::ptr_eq(m, member)).unwrap();
                let reach = cluster.center.distance_to(&positions[idx]) + member.size;
                assert!(reach <= cluster.radius + 1e-9);
            }
        }
    }
}
