//! Greedy pixel-distance clustering of community markers.
//!
//! Points are visited in input order. Each one joins a cluster whose centroid
//! lies within the threshold, otherwise it opens a new cluster. Centroids are
//! running means, updated as members arrive, so the outcome depends on input
//! order: a point judged against an early centroid may land in a cluster it
//! would not reach once that centroid has drifted.

use geo::{Distance, Euclidean, Point};
use log::debug;

use crate::data::CommunityRecord;
use crate::projection::{ProjectedPoint, Projection};
use crate::viewport::ClusterPolicy;

/// A group of nearby markers.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub centroid: ProjectedPoint,
    pub members: Vec<CommunityRecord>,
}

impl Cluster {
    fn seed(record: &CommunityRecord, at: ProjectedPoint) -> Self {
        Self { centroid: at, members: vec![record.clone()] }
    }

    fn absorb(&mut self, record: &CommunityRecord, at: ProjectedPoint) {
        self.members.push(record.clone());
        let n = self.members.len() as f64;
        self.centroid = self.centroid + (at - self.centroid) / n;
    }

    /// Single-member clusters render as a plain marker.
    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Text shown on an aggregate marker.
    pub fn label(&self) -> String {
        self.members.len().to_string()
    }
}

/// Builds clusters with the default first-fit policy.
pub fn build_clusters(records: &[CommunityRecord], projection: &Projection, threshold: f64) -> Vec<Cluster> {
    build_clusters_with(records, projection, threshold, ClusterPolicy::FirstFit)
}

pub fn build_clusters_with(
    records: &[CommunityRecord],
    projection: &Projection,
    threshold: f64,
    policy: ClusterPolicy,
) -> Vec<Cluster> {
    let points = records.iter().filter_map(|record| {
        let Some(location) = record.location else {
            debug!("event=cluster_skip reason=no_location id={}", record.id);
            return None;
        };
        match projection.project(location.lng, location.lat) {
            Some(at) => Some((record, at)),
            None => {
                debug!("event=cluster_skip reason=out_of_domain id={}", record.id);
                None
            }
        }
    });
    cluster_points(points, threshold, policy)
}

/// Clusters already-projected points. Exposed so callers with their own
/// projection (or tests) can drive the engine directly.
pub fn cluster_points<'a, I>(points: I, threshold: f64, policy: ClusterPolicy) -> Vec<Cluster>
where
    I: IntoIterator<Item = (&'a CommunityRecord, ProjectedPoint)>,
{
    let mut clusters: Vec<Cluster> = Vec::new();

    for (record, at) in points {
        let distance = |c: &Cluster| Euclidean.distance(Point::from(c.centroid), Point::from(at));
        let target = match policy {
            ClusterPolicy::FirstFit => clusters.iter().position(|c| distance(c) <= threshold),
            ClusterPolicy::Nearest => clusters
                .iter()
                .enumerate()
                .map(|(i, c)| (i, distance(c)))
                .filter(|(_, d)| *d <= threshold)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i),
        };

        match target {
            Some(i) => clusters[i].absorb(record, at),
            None => clusters.push(Cluster::seed(record, at)),
        }
    }

    debug!("event=clusters_built count={} threshold={threshold} policy={policy:?}", clusters.len());
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Location;
    use crate::viewport::{DeviceClass, MapSettings, ViewportConfig};
    use geo::Coord;

    fn record(id: &str) -> CommunityRecord {
        CommunityRecord {
            id: id.to_string(),
            name: format!("Community {id}"),
            province: "Córdoba".to_string(),
            location: None,
            description: None,
            website: None,
            slug: None,
        }
    }

    fn at(x: f64, y: f64) -> ProjectedPoint {
        Coord { x, y }
    }

    #[test]
    fn close_points_merge_with_mean_centroid() {
        let a = record("a");
        let b = record("b");
        let clusters = cluster_points(
            [(&a, at(100.0, 100.0)), (&b, at(105.0, 103.0))],
            20.0,
            ClusterPolicy::FirstFit,
        );

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 2);
        assert!((clusters[0].centroid.x - 102.5).abs() < 1e-9);
        assert!((clusters[0].centroid.y - 101.5).abs() < 1e-9);
        assert_eq!(clusters[0].label(), "2");
    }

    #[test]
    fn distant_points_stay_apart() {
        let a = record("a");
        let b = record("b");
        let clusters = cluster_points(
            [(&a, at(0.0, 0.0)), (&b, at(500.0, 500.0))],
            20.0,
            ClusterPolicy::FirstFit,
        );

        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(Cluster::is_single));
    }

    #[test]
    fn first_fit_and_nearest_disagree_near_boundaries() {
        let (a, b, c) = (record("a"), record("b"), record("c"));
        // c is within range of both seeds but closer to the second one.
        let points = || [(&a, at(0.0, 0.0)), (&b, at(30.0, 0.0)), (&c, at(18.0, 0.0))];

        let first = cluster_points(points(), 20.0, ClusterPolicy::FirstFit);
        assert_eq!(first[0].len(), 2);
        assert_eq!(first[1].len(), 1);

        let nearest = cluster_points(points(), 20.0, ClusterPolicy::Nearest);
        assert_eq!(nearest[0].len(), 1);
        assert_eq!(nearest[1].len(), 2);
    }

    #[test]
    fn records_without_a_place_are_skipped() {
        let settings = MapSettings::default();
        let vp = ViewportConfig::new(200.0, 160.0, DeviceClass::Full, &settings, 0.0);
        let projection = Projection::new(&vp);

        let mut placed = record("placed");
        placed.location = Some(Location { lat: -31.4, lng: -64.2 });
        let unplaced = record("unplaced");
        let mut polar = record("polar");
        polar.location = Some(Location { lat: -89.0, lng: -64.0 });

        let clusters = build_clusters(&[placed.clone(), unplaced, polar], &projection, 8.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec![placed]);
    }

    #[test]
    fn no_records_no_clusters() {
        let clusters = cluster_points(std::iter::empty(), 20.0, ClusterPolicy::Nearest);
        assert!(clusters.is_empty());
    }
}
