//! Readers for the small unlabeled CSV files the problems are built from.
//!
//! Every file has no header row, blank lines are skipped and fields are trimmed. Errors name the
//! 1-based line of the offending row.

use crate::error::{HermesError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;

/// A knapsack item
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item {
    pub cost: f64,
    pub weight: f64,
}

/// A city of a TSP instance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct City {
    pub x: f64,
    pub y: f64,
}

impl City {
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An undirected weighted edge of a graph
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub u: usize,
    pub v: usize,
    pub weight: f64,
}

pub fn read_items(path: impl AsRef<Path>) -> Result<Vec<Item>> {
    parse_items(std::fs::File::open(path)?)
}

pub fn read_cities(path: impl AsRef<Path>) -> Result<Vec<City>> {
    parse_cities(std::fs::File::open(path)?)
}

pub fn read_edges(path: impl AsRef<Path>) -> Result<Vec<Edge>> {
    parse_edges(std::fs::File::open(path)?)
}

/// Parses (cost, weight) rows
pub fn parse_items<R: Read>(reader: R) -> Result<Vec<Item>> {
    read_rows(reader, 2, 2)?
        .into_iter()
        .map(|(line, record)| {
            Ok(Item {
                cost: parse_field(&record, 0, line)?,
                weight: parse_field(&record, 1, line)?,
            })
        })
        .collect()
}

/// Parses (x, y) rows
pub fn parse_cities<R: Read>(reader: R) -> Result<Vec<City>> {
    read_rows(reader, 2, 2)?
        .into_iter()
        .map(|(line, record)| {
            Ok(City {
                x: parse_field(&record, 0, line)?,
                y: parse_field(&record, 1, line)?,
            })
        })
        .collect()
}

/// Parses (u, v) or (u, v, weight) rows, the weight defaults to 1
pub fn parse_edges<R: Read>(reader: R) -> Result<Vec<Edge>> {
    read_rows(reader, 2, 3)?
        .into_iter()
        .map(|(line, record)| {
            let weight = match record.len() {
                3 => parse_field(&record, 2, line)?,
                _ => 1.0,
            };

            Ok(Edge {
                u: parse_field(&record, 0, line)?,
                v: parse_field(&record, 1, line)?,
                weight,
            })
        })
        .collect()
}

/// Reads the non blank rows of a headerless CSV, checking the column count of each
fn read_rows<R: Read>(
    reader: R,
    min_cols: usize,
    max_cols: usize,
) -> Result<Vec<(usize, StringRecord)>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(rows.len() + 1, |p| p.line() as usize);

        if record.iter().all(str::is_empty) {
            continue;
        }

        if record.len() < min_cols || record.len() > max_cols {
            return Err(HermesError::Dataset {
                line,
                message: format!(
                    "expected between {min_cols} and {max_cols} columns, found {}",
                    record.len()
                ),
            });
        }

        rows.push((line, record));
    }

    Ok(rows)
}

fn parse_field<T: std::str::FromStr>(record: &StringRecord, col: usize, line: usize) -> Result<T> {
    let raw = record.get(col).unwrap_or_default();

    raw.parse::<T>().map_err(|_| HermesError::Dataset {
        line,
        message: format!("column {} is not a valid number: {raw:?}", col + 1),
    })
}
