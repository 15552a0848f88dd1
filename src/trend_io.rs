//! Persistence of the angle trend as a two-column CSV (`time,hip_angle`).
//!
//! Values are written with Rust's shortest round-trip float formatting, so a
//! saved series reloads bit-for-bit.

use crate::{
    angles::AngleSample,
    constants::{ANGLE_COLUMN, TIME_COLUMN},
    Error, Result,
};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Write a trend series to any writer
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_trend<W: Write>(samples: &[AngleSample], mut writer: W) -> Result<()> {
    writeln!(writer, "{TIME_COLUMN},{ANGLE_COLUMN}")?;
    for sample in samples {
        writeln!(writer, "{},{}", sample.time, sample.angle)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a trend series from any buffered reader
///
/// A leading `time,hip_angle` header is optional. Blank lines are skipped.
///
/// # Errors
///
/// Returns [`Error::ParseError`] for a row that does not hold exactly two
/// numeric fields, and [`Error::Io`] if reading fails.
pub fn read_trend<R: BufRead>(reader: R) -> Result<Vec<AngleSample>> {
    let mut samples = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if fields.len() != 2 {
            return Err(Error::parse(
                line_no,
                format!("expected 2 columns, found {}", fields.len()),
            ));
        }
        if line_no == 1 && fields == [TIME_COLUMN, ANGLE_COLUMN] {
            log::debug!("Skipping trend header: {}", trimmed);
            continue;
        }

        let parse = |field: &str, name: &str| {
            field
                .parse::<f64>()
                .map_err(|e| Error::parse(line_no, format!("invalid {name} '{field}': {e}")))
        };
        samples.push(AngleSample {
            time: parse(fields[0], TIME_COLUMN)?,
            angle: parse(fields[1], ANGLE_COLUMN)?,
        });
    }
    Ok(samples)
}

/// Save a trend series to a CSV file
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an empty series and [`Error::Io`] if
/// the file cannot be written.
pub fn save_trend<P: AsRef<Path>>(samples: &[AngleSample], path: P) -> Result<()> {
    if samples.is_empty() {
        return Err(Error::InvalidInput("No trend data to save".to_string()));
    }
    let file = File::create(path.as_ref())?;
    write_trend(samples, BufWriter::new(file))?;
    log::info!("Saved {} samples to {}", samples.len(), path.as_ref().display());
    Ok(())
}

/// Load a trend series from a CSV file
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and
/// [`Error::ParseError`] for malformed rows.
pub fn load_trend<P: AsRef<Path>>(path: P) -> Result<Vec<AngleSample>> {
    let file = File::open(path.as_ref())?;
    let samples = read_trend(BufReader::new(file))?;
    log::info!("Loaded {} samples from {}", samples.len(), path.as_ref().display());
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_format() {
        let mut out = Vec::new();
        write_trend(&[AngleSample { time: 0.5, angle: -12.25 }], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "time,hip_angle\n0.5,-12.25\n");
    }

    #[test]
    fn test_reload_is_exact() {
        let samples = vec![
            AngleSample { time: 0.1, angle: 1.0 / 3.0 },
            AngleSample { time: 0.2, angle: -std::f64::consts::PI },
        ];
        let mut out = Vec::new();
        write_trend(&samples, &mut out).unwrap();
        assert_eq!(read_trend(out.as_slice()).unwrap(), samples);
    }

    #[test]
    fn test_headerless_input() {
        let samples = read_trend("0.0,1.5\n0.1,2.5\n".as_bytes()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].angle, 2.5);
    }

    #[test]
    fn test_extra_column_rejected() {
        let result = read_trend("time,hip_angle,extra\n0.0,1.0,2.0\n".as_bytes());
        assert!(matches!(result, Err(Error::ParseError { line: 1, .. })));
    }

    #[test]
    fn test_unknown_first_row_is_not_a_header() {
        let result = read_trend("abc,1.0\n0.1,2.0\n".as_bytes());
        match result {
            Err(Error::ParseError { line, message }) => {
                assert_eq!(line, 1);
                assert!(message.contains("time"));
            }
            other => panic!("Expected ParseError, got {other:?}"),
        }
        assert!(matches!(
            read_trend("t,angle\n0.0,1.0\n".as_bytes()),
            Err(Error::ParseError { line: 1, .. })
        ));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let result = read_trend("time,hip_angle\n0.0,1.0\n0.1,abc\n".as_bytes());
        match result {
            Err(Error::ParseError { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("hip_angle"));
            }
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_save_empty_rejected() {
        let path = std::env::temp_dir().join("trendetect_empty_trend.csv");
        assert!(matches!(save_trend(&[], &path), Err(Error::InvalidInput(_))));
    }
}
