//! Course Model
//!
//! Holes and their green reference points. A course is validated once on
//! construction and afterwards only changes one whole hole at a time.

use crate::domain::error::CourseError;
use crate::domain::models::{GeoPoint, GreenPoint, Landmark, LandmarkId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hole {
    pub number: u32,
    pub front: GeoPoint,
    pub center: GeoPoint,
    pub back: GeoPoint,
}

impl Hole {
    pub fn new(number: u32, front: GeoPoint, center: GeoPoint, back: GeoPoint) -> Self {
        Self {
            number,
            front,
            center,
            back,
        }
    }

    pub fn point(&self, point: GreenPoint) -> GeoPoint {
        match point {
            GreenPoint::Front => self.front,
            GreenPoint::Center => self.center,
            GreenPoint::Back => self.back,
        }
    }

    fn is_finite(&self) -> bool {
        self.front.is_finite() && self.center.is_finite() && self.back.is_finite()
    }
}

/// On-disk layout of a hole, one flat record per hole
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoleRecord {
    hole_number: u32,
    front_lat: f64,
    front_lon: f64,
    center_lat: f64,
    center_lon: f64,
    back_lat: f64,
    back_lon: f64,
}

impl From<HoleRecord> for Hole {
    fn from(r: HoleRecord) -> Self {
        Hole::new(
            r.hole_number,
            GeoPoint::new(r.front_lat, r.front_lon),
            GeoPoint::new(r.center_lat, r.center_lon),
            GeoPoint::new(r.back_lat, r.back_lon),
        )
    }
}

impl From<&Hole> for HoleRecord {
    fn from(h: &Hole) -> Self {
        Self {
            hole_number: h.number,
            front_lat: h.front.latitude,
            front_lon: h.front.longitude,
            center_lat: h.center.latitude,
            center_lon: h.center.longitude,
            back_lat: h.back.latitude,
            back_lon: h.back.longitude,
        }
    }
}

/// Fixed set of holes keyed by hole number.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseModel {
    holes: BTreeMap<u32, Hole>,
}

impl CourseModel {
    pub fn new(holes: impl IntoIterator<Item = Hole>) -> Result<Self, CourseError> {
        let mut map = BTreeMap::new();
        for hole in holes {
            if !hole.is_finite() {
                return Err(CourseError::InvalidCoordinate { hole: hole.number });
            }
            if map.insert(hole.number, hole).is_some() {
                return Err(CourseError::DuplicateHole(hole.number));
            }
        }
        if map.is_empty() {
            return Err(CourseError::Empty);
        }
        Ok(Self { holes: map })
    }

    pub fn from_json(json: &str) -> Result<Self, CourseError> {
        let records: Vec<HoleRecord> = serde_json::from_str(json)?;
        Self::new(records.into_iter().map(Hole::from))
    }

    pub fn load(path: &Path) -> Result<Self, CourseError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn to_json(&self) -> Result<String, CourseError> {
        let records: Vec<HoleRecord> = self.holes.values().map(HoleRecord::from).collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    pub fn hole(&self, number: u32) -> Option<&Hole> {
        self.holes.get(&number)
    }

    /// Holes in ascending hole-number order
    pub fn holes(&self) -> impl Iterator<Item = &Hole> {
        self.holes.values()
    }

    pub fn hole_count(&self) -> usize {
        self.holes.len()
    }

    /// Every landmark, hole ascending, then front/center/back.
    pub fn landmarks(&self) -> impl Iterator<Item = Landmark> + '_ {
        self.holes.values().flat_map(|hole| {
            GreenPoint::ALL.into_iter().map(move |point| Landmark {
                id: LandmarkId {
                    hole: hole.number,
                    point,
                },
                position: hole.point(point),
            })
        })
    }

    /// Replace all three points of a hole. Either every point changes or,
    /// on error, none does.
    pub fn update_hole(
        &mut self,
        number: u32,
        front: GeoPoint,
        center: GeoPoint,
        back: GeoPoint,
    ) -> Result<(), CourseError> {
        let replacement = Hole::new(number, front, center, back);
        if !replacement.is_finite() {
            return Err(CourseError::InvalidCoordinate { hole: number });
        }
        let slot = self
            .holes
            .get_mut(&number)
            .ok_or(CourseError::UnknownHole(number))?;
        *slot = replacement;
        Ok(())
    }

    /// The home course shipped with the app.
    pub fn built_in() -> Self {
        let holes = BUILT_IN_COURSE.iter().map(|(number, [f, c, b])| {
            Hole::new(
                *number,
                GeoPoint::new(f.0, f.1),
                GeoPoint::new(c.0, c.1),
                GeoPoint::new(b.0, b.1),
            )
        });
        Self {
            holes: holes.map(|h| (h.number, h)).collect(),
        }
    }
}

impl Default for CourseModel {
    fn default() -> Self {
        Self::built_in()
    }
}

type PointTable = [(f64, f64); 3];

// (hole, [front, center, back]) as (latitude, longitude)
const BUILT_IN_COURSE: [(u32, PointTable); 18] = [
    (1, [(51.396308, -0.155970), (51.396422, -0.155929), (51.396542, -0.155856)]),
    (2, [(51.393808, -0.157557), (51.393682, -0.157619), (51.39355, -0.157675)]),
    (3, [(51.394314, -0.155379), (51.394421, -0.155289), (51.394542, -0.155197)]),
    (4, [(51.396091, -0.153170), (51.396070, -0.153017), (51.396058, -0.152823)]),
    (5, [(51.392561, -0.152644), (51.392479, -0.152684), (51.392398, -0.152713)]),
    (6, [(51.390405, -0.151437), (51.390391, -0.151228), (51.390427, -0.151058)]),
    (7, [(51.390458, -0.148738), (51.390466, -0.148462), (51.390478, -0.148194)]),
    (8, [(51.390616, -0.150296), (51.390626, -0.150528), (51.390634, -0.150810)]),
    (9, [(51.391532, -0.152851), (51.391587, -0.153015), (51.391652, -0.153178)]),
    (10, [(51.393182, -0.147403), (51.393265, -0.147288), (51.393362, -0.147173)]),
    (11, [(51.391417, -0.149025), (51.391333, -0.149169), (51.391251, -0.149333)]),
    (12, [(51.391112, -0.144649), (51.391125, -0.144493), (51.391146, -0.144348)]),
    (13, [(51.393641, -0.146317), (51.393733, -0.146399), (51.393805, -0.146520)]),
    (14, [(51.392472, -0.150344), (51.392401, -0.150496), (51.392343, -0.150647)]),
    (15, [(51.394402, -0.150899), (51.394519, -0.150951), (51.394637, -0.150984)]),
    (16, [(51.395054, -0.151506), (51.395102, -0.151629), (51.395154, -0.151755)]),
    (17, [(51.392717, -0.153210), (51.392612, -0.153217), (51.392506, -0.153242)]),
    (18, [(51.393139, -0.155654), (51.393185, -0.155855), (51.393254, -0.156092)]),
];
