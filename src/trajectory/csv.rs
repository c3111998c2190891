// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Reading waypoints from and writing trajectories to comma separated files.
//!
//! Input files start with a title row which is ignored, followed by one `x,y,z` row per point.
//! Exported files contain one row per retained point of a
//! [`SegmentBuffer`](`crate::SegmentBuffer`) with the values of all axes.
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use crate::exception::{ZheadException, ZheadResult};
use crate::trajectory::segment_buffer::SegmentBuffer;

/// Parses all records of a point source.
///
/// The whole source is parsed before anything is returned, so a malformed record never leads
/// to a partially loaded trajectory. Empty lines are skipped and the end of the source ends
/// the load.
/// # Errors
/// * [`FormatError`](`crate::exception::ZheadException::FormatError`) if a record does not
/// consist of exactly three numbers or a line is not valid UTF-8.
/// * [`IoError`](`crate::exception::ZheadException::IoError`) if the source cannot be read.
pub fn parse_points<R: BufRead>(source: R) -> ZheadResult<Vec<[f64; 3]>> {
    let mut points = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(ZheadException::FormatError {
                    line: index + 1,
                    message: "record is not valid UTF-8".to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        if index == 0 {
            continue;
        }
        let record = line.trim();
        if record.is_empty() {
            continue;
        }
        points.push(parse_record(record, index + 1)?);
    }
    Ok(points)
}

fn parse_record(record: &str, line: usize) -> ZheadResult<[f64; 3]> {
    let fields: Vec<&str> = record.split(',').map(|field| field.trim()).collect();
    if fields.len() != 3 {
        return Err(ZheadException::FormatError {
            line,
            message: format!("expected 3 fields but found {}", fields.len()),
        });
    }
    let mut point = [0f64; 3];
    for (value, field) in point.iter_mut().zip(fields.iter()) {
        *value = field.parse::<f64>().map_err(|_| ZheadException::FormatError {
            line,
            message: format!("{:?} is not a number", field),
        })?;
        if !value.is_finite() {
            return Err(ZheadException::FormatError {
                line,
                message: format!("{:?} is not a finite position", field),
            });
        }
    }
    Ok(point)
}

/// Opens and parses a point file, see [`parse_points`].
pub fn read_points_file<P: AsRef<Path>>(path: P) -> ZheadResult<Vec<[f64; 3]>> {
    let file = File::open(path.as_ref()).map_err(|e| ZheadException::IoError {
        message: format!("could not open {}: {}", path.as_ref().display(), e),
    })?;
    parse_points(BufReader::new(file))
}

/// Writes the positions of all retained points, one row per point.
pub fn export_positions<W: Write>(buffer: &SegmentBuffer, writer: W) -> ZheadResult<()> {
    let columns = (0..buffer.axis_count())
        .map(|axis| buffer.positions_view(axis).map(|x| x.collect()))
        .collect::<ZheadResult<Vec<Vec<f64>>>>()?;
    write_rows(&columns, writer)
}

/// Writes the velocities of all retained points, one row per point.
pub fn export_velocities<W: Write>(buffer: &SegmentBuffer, writer: W) -> ZheadResult<()> {
    let columns = (0..buffer.axis_count())
        .map(|axis| buffer.velocities_view(axis).map(|x| x.collect()))
        .collect::<ZheadResult<Vec<Vec<f64>>>>()?;
    write_rows(&columns, writer)
}

/// Writes the positions of all retained points to a file, see [`export_positions`].
pub fn export_positions_file<P: AsRef<Path>>(buffer: &SegmentBuffer, path: P) -> ZheadResult<()> {
    export_positions(buffer, BufWriter::new(File::create(path)?))
}

/// Writes the velocities of all retained points to a file, see [`export_velocities`].
pub fn export_velocities_file<P: AsRef<Path>>(
    buffer: &SegmentBuffer,
    path: P,
) -> ZheadResult<()> {
    export_velocities(buffer, BufWriter::new(File::create(path)?))
}

fn write_rows<W: Write>(columns: &[Vec<f64>], mut writer: W) -> ZheadResult<()> {
    let rows = columns.first().map_or(0, |column| column.len());
    for row in 0..rows {
        let line = columns
            .iter()
            .map(|column| format!("{:.6}", column[row]))
            .collect::<Vec<String>>()
            .join(",");
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}
