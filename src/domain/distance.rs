//! Distance Engine
//!
//! Great-circle distances from the golfer to every landmark on the course.
//! The engine holds no state; every call builds a fresh report.

use crate::domain::course::CourseModel;
use crate::domain::equipment::EquipmentSet;
use crate::domain::error::DistanceError;
use crate::domain::models::{GeoPoint, LandmarkId};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters to yards
pub const YARDS_PER_METER: f64 = 1.09361;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkDistance {
    pub landmark: LandmarkId,
    pub yards: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceReport {
    position: GeoPoint,
    distances: Vec<LandmarkDistance>,
    equipment: EquipmentSet,
}

impl DistanceReport {
    pub fn position(&self) -> GeoPoint {
        self.position
    }

    /// Distances in course order
    pub fn distances(&self) -> &[LandmarkDistance] {
        &self.distances
    }

    pub fn equipment(&self) -> &EquipmentSet {
        &self.equipment
    }

    pub fn distance_to(&self, landmark: LandmarkId) -> Option<f64> {
        self.distances
            .iter()
            .find(|d| d.landmark == landmark)
            .map(|d| d.yards)
    }
}

/// Haversine distance in meters.
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceEngine;

impl DistanceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Build a report for `position`. A missing fix is the caller's problem
    /// and is never replaced by a default coordinate.
    pub fn compute(
        &self,
        position: Option<GeoPoint>,
        course: &CourseModel,
        equipment: &EquipmentSet,
    ) -> Result<DistanceReport, DistanceError> {
        let position = position.ok_or(DistanceError::PositionUnavailable)?;
        if !position.is_finite() {
            return Err(DistanceError::InvalidPosition {
                latitude: position.latitude,
                longitude: position.longitude,
            });
        }

        let distances = course
            .landmarks()
            .map(|landmark| LandmarkDistance {
                landmark: landmark.id,
                yards: haversine_meters(position, landmark.position) * YARDS_PER_METER,
            })
            .collect();

        Ok(DistanceReport {
            position,
            distances,
            equipment: equipment.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::course::Hole;
    use crate::domain::equipment::EquipmentEntry;
    use crate::domain::models::GreenPoint;

    const TOLERANCE: f64 = 1e-6;

    fn single_hole(front: GeoPoint, center: GeoPoint, back: GeoPoint) -> CourseModel {
        CourseModel::new(vec![Hole::new(1, front, center, back)]).unwrap()
    }

    #[test]
    fn test_zero_distance_when_standing_on_every_point() {
        let here = GeoPoint::new(51.3963, -0.1559);
        let course = single_hole(here, here, here);

        let report = DistanceEngine::new()
            .compute(Some(here), &course, &EquipmentSet::default())
            .unwrap();

        assert_eq!(report.distances().len(), 3);
        assert!(report.distances().iter().all(|d| d.yards.abs() < TOLERANCE));
    }

    #[test]
    fn test_known_separation_converts_to_yards() {
        // One hundredth of a degree along a meridian
        let origin = GeoPoint::new(51.0, -0.15);
        let north = GeoPoint::new(51.01, -0.15);
        let meters = EARTH_RADIUS_M * 0.01_f64.to_radians();

        let course = single_hole(north, north, north);
        let report = DistanceEngine::new()
            .compute(Some(origin), &course, &EquipmentSet::default())
            .unwrap();

        let expected = meters * YARDS_PER_METER;
        for d in report.distances() {
            assert!((d.yards - expected).abs() < TOLERANCE, "{} != {}", d.yards, expected);
        }
    }

    #[test]
    fn test_compute_is_deterministic() {
        let course = CourseModel::built_in();
        let bag = EquipmentSet::new(vec![EquipmentEntry::new("Driver", 240.0)]);
        let here = GeoPoint::new(51.3935, -0.1530);
        let engine = DistanceEngine::new();

        let a = engine.compute(Some(here), &course, &bag).unwrap();
        let b = engine.compute(Some(here), &course, &bag).unwrap();

        assert_eq!(a.distances().len(), b.distances().len());
        for (x, y) in a.distances().iter().zip(b.distances()) {
            assert_eq!(x.landmark, y.landmark);
            assert!((x.yards - y.yards).abs() < TOLERANCE);
        }
        assert_eq!(a.equipment(), b.equipment());
    }

    #[test]
    fn test_report_follows_course_order_and_carries_equipment() {
        let course = CourseModel::built_in();
        let bag = EquipmentSet::new(vec![EquipmentEntry::new("Driver", 250.0)]);
        let report = DistanceEngine::new()
            .compute(Some(GeoPoint::new(51.39, -0.15)), &course, &bag)
            .unwrap();

        let expected: Vec<LandmarkId> = course.landmarks().map(|l| l.id).collect();
        let actual: Vec<LandmarkId> = report.distances().iter().map(|d| d.landmark).collect();
        assert_eq!(actual, expected);
        assert_eq!(report.equipment().get("Driver").unwrap().distance, 250.0);

        // Hole 1 is a few hundred yards away and its back edge is beyond its front
        let front = report
            .distance_to(LandmarkId { hole: 1, point: GreenPoint::Front })
            .unwrap();
        let back = report
            .distance_to(LandmarkId { hole: 1, point: GreenPoint::Back })
            .unwrap();
        assert!(front > 100.0 && front < 1000.0);
        assert!(back > front);
    }

    #[test]
    fn test_missing_or_invalid_position_is_an_error() {
        let course = CourseModel::built_in();
        let engine = DistanceEngine::new();

        assert_eq!(
            engine.compute(None, &course, &EquipmentSet::default()),
            Err(DistanceError::PositionUnavailable)
        );
        assert!(matches!(
            engine.compute(
                Some(GeoPoint::new(f64::NAN, 0.0)),
                &course,
                &EquipmentSet::default()
            ),
            Err(DistanceError::InvalidPosition { .. })
        ));
    }
}
