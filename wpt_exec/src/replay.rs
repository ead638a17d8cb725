//! # Offline replay records
//!
//! Paths and pose sequences are read from CSV files so the follower can be
//! run offline against recorded data. The per-cycle results are flattened
//! into [`CycleRecord`]s which can be written back out as CSV.
//!
//! Waypoint files have the header `x,y,z,yaw,speed`, where `yaw` may be left
//! empty. Pose files have the header `x,y,z,yaw`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::{io, path::Path};

// Internal
use crate::{
    follower::{FollowOutput, StatusReport},
    loc::Pose,
    path::{Waypoint, WaypointPath},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One row of a waypoint file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WaypointRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: Option<f64>,
    pub speed: f64,
}

/// One row of a pose file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PoseRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
}

/// Flattened result of a single follower cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CycleRecord {
    pub cycle: usize,
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub index: usize,
    pub nearest_index: usize,
    pub cte_m: f64,
    pub target_speed_ms: f64,
    pub dist_to_target_m: f64,
    pub decel_rate: f64,
    pub velocity_negligible: bool,
    pub heading_advanced: bool,
    pub degenerate_fit: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Could not read record {row}: {source}")]
    BadRecord { row: usize, source: csv::Error },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl From<WaypointRecord> for Waypoint {
    fn from(r: WaypointRecord) -> Self {
        Self {
            position_m: Vector3::new(r.x, r.y, r.z),
            attitude_q: r.yaw.map(|yaw| UnitQuaternion::from_euler_angles(0.0, 0.0, yaw)),
            target_speed_ms: r.speed,
        }
    }
}

impl From<PoseRecord> for Pose {
    fn from(r: PoseRecord) -> Self {
        Self {
            position_m: Vector3::new(r.x, r.y, r.z),
            attitude_q: UnitQuaternion::from_euler_angles(0.0, 0.0, r.yaw),
        }
    }
}

impl CycleRecord {
    pub fn new(cycle: usize, pose: &Pose, output: &FollowOutput, report: &StatusReport) -> Self {
        Self {
            cycle,
            x: pose.position_m[0],
            y: pose.position_m[1],
            heading: pose.get_heading(),
            index: output.index,
            nearest_index: report.nearest_index,
            cte_m: output.cte_m,
            target_speed_ms: output.target_speed_ms,
            dist_to_target_m: output.dist_to_target_m,
            decel_rate: output.decel_rate,
            velocity_negligible: output.velocity_negligible,
            heading_advanced: report.heading_advanced,
            degenerate_fit: report.degenerate_fit,
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Read all records of type `T` from CSV data with a header row.
fn read_records<T, R>(reader: R) -> Result<Vec<T>, ReplayError>
where
    T: for<'de> Deserialize<'de>,
    R: io::Read,
{
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    rdr.deserialize()
        .enumerate()
        .map(|(row, rec)| rec.map_err(|source| ReplayError::BadRecord { row, source }))
        .collect()
}

/// Read a waypoint path from CSV data.
pub fn read_waypoints<R: io::Read>(reader: R) -> Result<WaypointPath, ReplayError> {
    let records: Vec<WaypointRecord> = read_records(reader)?;

    Ok(records.into_iter().map(Waypoint::from).collect::<Vec<_>>().into())
}

/// Load a waypoint path from a CSV file.
pub fn load_waypoints<P: AsRef<Path>>(path: P) -> Result<WaypointPath, ReplayError> {
    read_waypoints(open(path)?)
}

/// Read a sequence of poses from CSV data.
pub fn read_poses<R: io::Read>(reader: R) -> Result<Vec<Pose>, ReplayError> {
    let records: Vec<PoseRecord> = read_records(reader)?;

    Ok(records.into_iter().map(Pose::from).collect())
}

/// Load a sequence of poses from a CSV file.
pub fn load_poses<P: AsRef<Path>>(path: P) -> Result<Vec<Pose>, ReplayError> {
    read_poses(open(path)?)
}

/// Write cycle records as CSV, including a header row.
pub fn write_cycles<W: io::Write>(writer: W, cycles: &[CycleRecord]) -> Result<(), ReplayError> {
    let mut wtr = csv::Writer::from_writer(writer);

    for c in cycles {
        wtr.serialize(c)?;
    }

    wtr.flush().map_err(csv::Error::from)?;

    Ok(())
}

fn open<P: AsRef<Path>>(path: P) -> Result<std::fs::File, ReplayError> {
    std::fs::File::open(path).map_err(|e| ReplayError::CsvError(csv::Error::from(e)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_read_waypoints() {
        let data = "x,y,z,yaw,speed\n\
                    0.0, 0.0, 0.0, , 5.0\n\
                    1.0, 0.5, 0.1, 1.5707963267948966, 4.5\n";

        let path = read_waypoints(data.as_bytes()).unwrap();

        assert_eq!(path.get_num_points(), 2);

        let w0 = path.get(0).unwrap();
        assert_eq!(w0.position_m, Vector3::zeros());
        assert!(w0.attitude_q.is_none());
        assert_eq!(w0.target_speed_ms, 5.0);

        let w1 = path.get(1).unwrap();
        assert_eq!(w1.position_m, Vector3::new(1.0, 0.5, 0.1));
        assert!((w1.attitude_q.unwrap().euler_angles().2 - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_read_poses() {
        let data = "x,y,z,yaw\n2.0,-1.0,0.0,3.0\n";

        let poses = read_poses(data.as_bytes()).unwrap();

        assert_eq!(poses.len(), 1);
        assert_eq!(poses[0].position_m, Vector3::new(2.0, -1.0, 0.0));
        assert!((poses[0].get_heading() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_bad_record() {
        let data = "x,y,z,yaw\n0,0,0,0\n1,oops,0,0\n";

        match read_poses(data.as_bytes()) {
            Err(ReplayError::BadRecord { row, .. }) => assert_eq!(row, 1),
            r => panic!("Expected a bad record error, got {:?}", r),
        }
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_poses("/this/file/does/not/exist.csv"),
            Err(ReplayError::CsvError(_))
        ));
    }

    #[test]
    fn test_write_cycles() {
        let pose = Pose::from_xy_heading(1.0, 2.0, 0.0);
        let output = FollowOutput {
            index: 3,
            cte_m: 0.25,
            target_speed_ms: 4.0,
            dist_to_target_m: 2.0,
            decel_rate: 2.0,
            velocity_negligible: false,
        };
        let report = StatusReport {
            nearest_index: 2,
            heading_advanced: true,
            degenerate_fit: false,
        };

        let mut buf = Vec::new();
        write_cycles(&mut buf, &[CycleRecord::new(0, &pose, &output, &report)]).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some(
                "cycle,x,y,heading,index,nearest_index,cte_m,target_speed_ms,\
                 dist_to_target_m,decel_rate,velocity_negligible,heading_advanced,degenerate_fit"
            )
        );
        assert_eq!(lines.next(), Some("0,1.0,2.0,0.0,3,2,0.25,4.0,2.0,2.0,false,true,false"));
    }
}
