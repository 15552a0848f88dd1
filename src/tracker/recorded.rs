//! Wide CSV recordings of tracker output.
//!
//! Layout: an optional `frame` column, a `time` column, then one
//! `id_<n>_x` / `id_<n>_y` column pair per marker. Empty cells mean the
//! marker was not detected in that frame.
//!
//! ```text
//! frame,time,id_0_x,id_0_y,id_3_x,id_3_y
//! 0,0.0,412.5,1210.0,,
//! 4,0.1333,413.0,1209.5,220.25,388.0
//! ```

use super::Tracker;
use crate::{
    constants::TIME_COLUMN,
    table::{Frame, FrameTable, MarkerId, Observation, Point2},
    Error, Result,
};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Column holding the source frame index
const FRAME_COLUMN: &str = "frame";

/// Replays a tracker recording instead of processing video
pub struct RecordedTracker {
    fps: f64,
}

impl RecordedTracker {
    /// `fps` only matters for recordings without a `time` column
    #[must_use]
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }
}

impl Tracker for RecordedTracker {
    fn track(&mut self, source: &Path, _dictionary: &str, frame_step: usize) -> Result<FrameTable> {
        info!("Replaying tracker recording: {}", source.display());
        // Recordings already contain only the frames that were tracked
        debug!("Ignoring frame step {} for recorded input", frame_step);
        let file = File::open(source)?;
        read_marker_csv(BufReader::new(file), self.fps)
    }

    fn name(&self) -> &str {
        "RecordedTracker"
    }
}

/// Which field of a marker a column holds
#[derive(Debug, Clone, Copy)]
enum Coord {
    X,
    Y,
}

/// Parse `id_<n>_x` / `id_<n>_y`
fn parse_marker_column(name: &str) -> Option<(MarkerId, Coord)> {
    let rest = name.strip_prefix("id_")?;
    let (id, coord) = rest.rsplit_once('_')?;
    let coord = match coord {
        "x" => Coord::X,
        "y" => Coord::Y,
        _ => return None,
    };
    id.parse().ok().map(|n| (MarkerId(n), coord))
}

/// Read a wide marker CSV into a frame table
///
/// Without a `frame` column the row number is the frame index; without a
/// `time` column the timestamp is `frame / fps`.
///
/// # Errors
///
/// Returns [`Error::ParseError`] for a missing header or malformed rows and
/// [`Error::InvalidInput`] if frames are not ordered.
pub fn read_marker_csv<R: BufRead>(reader: R, fps: f64) -> Result<FrameTable> {
    let mut lines = reader.lines();
    let header = lines.next().ok_or_else(|| Error::parse(1, "empty recording"))??;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    // Leading unnamed column is a row index written by dataframe tools
    let frame_col = columns
        .iter()
        .position(|c| *c == FRAME_COLUMN || c.is_empty());
    let time_col = columns.iter().position(|c| *c == TIME_COLUMN);
    if time_col.is_none() && !(fps > 0.0) {
        return Err(Error::parse(1, "no time column and no frame rate to derive one"));
    }

    let mut markers: BTreeMap<MarkerId, [Option<usize>; 2]> = BTreeMap::new();
    for (col, name) in columns.iter().enumerate() {
        match parse_marker_column(name) {
            Some((id, Coord::X)) => markers.entry(id).or_default()[0] = Some(col),
            Some((id, Coord::Y)) => markers.entry(id).or_default()[1] = Some(col),
            None if Some(col) != frame_col && Some(col) != time_col => {
                debug!("Ignoring column '{}'", name);
            }
            None => {}
        }
    }
    let markers: Vec<(MarkerId, usize, usize)> = markers
        .into_iter()
        .filter_map(|(id, cols)| match cols {
            [Some(x), Some(y)] => Some((id, x, y)),
            _ => {
                debug!("Marker {} lacks an x/y column pair", id);
                None
            }
        })
        .collect();

    let mut frames = Vec::new();
    for (row, line) in lines.enumerate() {
        let line = line?;
        let line_no = row + 2;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let cell = |col: usize| -> Result<Option<f64>> {
            match fields.get(col).copied() {
                None | Some("") => Ok(None),
                Some(text) => text
                    .parse::<f64>()
                    .map(|v| v.is_finite().then_some(v))
                    .map_err(|e| Error::parse(line_no, format!("column {}: {e}", columns[col]))),
            }
        };

        let index = match frame_col {
            Some(col) => {
                let text = fields.get(col).copied().unwrap_or_default();
                text.parse::<usize>()
                    .map_err(|e| Error::parse(line_no, format!("frame index '{text}': {e}")))?
            }
            None => frames.len(),
        };
        let time = match time_col {
            Some(col) => cell(col)?.ok_or_else(|| Error::parse(line_no, "missing timestamp"))?,
            None => index as f64 / fps,
        };

        let mut observations = Vec::new();
        for &(marker, x_col, y_col) in &markers {
            if let (Some(x), Some(y)) = (cell(x_col)?, cell(y_col)?) {
                observations.push(Observation {
                    marker,
                    position: Point2::new(x, y),
                });
            }
        }
        frames.push(Frame {
            index,
            time,
            observations,
        });
    }

    info!("Read {} frames with {} markers", frames.len(), markers.len());
    FrameTable::new(frames)
}

/// Write a frame table in the wide marker CSV layout
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_marker_csv<W: Write>(table: &FrameTable, mut writer: W) -> Result<()> {
    let ids: Vec<MarkerId> = table.marker_ids().into_iter().collect();

    let mut header = format!("{FRAME_COLUMN},{TIME_COLUMN}");
    for id in &ids {
        header.push_str(&format!(",{id}_x,{id}_y"));
    }
    writeln!(writer, "{header}")?;

    for frame in table.frames() {
        let mut line = format!("{},{}", frame.index, frame.time);
        for &id in &ids {
            match frame.position_of(id) {
                Some(p) => line.push_str(&format!(",{},{}", p.x, p.y)),
                None => line.push_str(",,"),
            }
        }
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDING: &str = "\
frame,time,id_0_x,id_0_y,id_12_x,id_12_y,notes
0,0.0,10.5,20.0,,,start
4,0.1333,11.0,21.0,300.0,40.0,
8,0.2667,,,301.0,41.0,
";

    #[test]
    fn test_parse_marker_column() {
        assert!(matches!(parse_marker_column("id_12_x"), Some((MarkerId(12), Coord::X))));
        assert!(matches!(parse_marker_column("id_3_y"), Some((MarkerId(3), Coord::Y))));
        assert!(parse_marker_column("time").is_none());
        assert!(parse_marker_column("id_a_x").is_none());
        assert!(parse_marker_column("id_1_z").is_none());
    }

    #[test]
    fn test_read_recording() {
        let table = read_marker_csv(RECORDING.as_bytes(), 30.0).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.frames()[1].index, 4);
        assert_eq!(table.frames()[0].observations.len(), 1);
        assert_eq!(table.frames()[1].position_of(MarkerId(12)), Some(Point2::new(300.0, 40.0)));
        assert!(table.frames()[2].position_of(MarkerId(0)).is_none());
    }

    #[test]
    fn test_unnamed_index_column() {
        let csv = ",time,id_1_x,id_1_y\n0,0.0,1.0,2.0\n1,0.1,1.5,2.5\n";
        let table = read_marker_csv(csv.as_bytes(), 30.0).unwrap();
        assert_eq!(table.frames()[1].index, 1);
        assert_eq!(table.marker_ids().len(), 1);
    }

    #[test]
    fn test_time_derived_from_fps() {
        let csv = "frame,id_1_x,id_1_y\n0,1.0,2.0\n3,1.0,2.0\n";
        let table = read_marker_csv(csv.as_bytes(), 30.0).unwrap();
        assert!((table.frames()[1].time - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_bad_cell_reports_line() {
        let csv = "time,id_1_x,id_1_y\n0.0,1.0,2.0\n0.1,oops,2.0\n";
        match read_marker_csv(csv.as_bytes(), 30.0) {
            Err(Error::ParseError { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_recording() {
        assert!(matches!(read_marker_csv("".as_bytes(), 30.0), Err(Error::ParseError { .. })));
    }

    #[test]
    fn test_write_then_read_preserves_table() {
        let table = read_marker_csv(RECORDING.as_bytes(), 30.0).unwrap();
        let mut out = Vec::new();
        write_marker_csv(&table, &mut out).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.starts_with("frame,time,id_0_x,id_0_y,id_12_x,id_12_y\n"));
        assert_eq!(read_marker_csv(out.as_slice(), 30.0).unwrap(), table);
    }
}
