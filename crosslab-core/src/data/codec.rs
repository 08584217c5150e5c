//! CSV codecs for bars and cross signals.
//!
//! Bars: `datetime, open, high, low, close`. Extra columns are ignored and a
//! UTF-8 BOM on the header is tolerated.
//!
//! Signals: `datetime, close, ema_fast, ema_slow, angle_degrees`, one file per
//! direction (`{symbol}_golden_cross.csv`, `{symbol}_death_cross.csv`) with a
//! `_today` variant for the current session. The aggregate files prepend
//! `symbol, direction` and are sorted newest first.
//!
//! Trend signals: `symbol, datetime, type, price, reason`, appended to one
//! file per day (`trend_signals_{YYYYMMDD}.csv`).

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};

use super::DataError;
use crate::domain::{normalize_bars, Bar, CrossEvent, Direction};
use crate::signals::EntrySignal;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const AGGREGATE_FILE: &str = "all_signals.csv";
pub const AGGREGATE_TODAY_FILE: &str = "all_signals_today.csv";

const DATETIME_FALLBACKS: [&str; 4] = [
    DATETIME_FORMAT,
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

pub fn parse_datetime(value: &str) -> Result<NaiveDateTime, DataError> {
    let value = value.trim();
    DATETIME_FALLBACKS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| DataError::InvalidTimestamp(value.to_string()))
}

pub fn format_datetime(ts: NaiveDateTime) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

/// `{symbol}_golden_cross.csv`, `{symbol}_death_cross_today.csv`, ...
pub fn signal_file_name(symbol: &str, direction: Direction, today: bool) -> String {
    let kind = match direction {
        Direction::Up => "golden_cross",
        Direction::Down => "death_cross",
    };
    if today {
        format!("{symbol}_{kind}_today.csv")
    } else {
        format!("{symbol}_{kind}.csv")
    }
}

/// Column positions resolved from a header row.
struct Columns {
    headers: StringRecord,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let headers = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase())
            .collect();
        Self { headers }
    }

    /// Index of the first header matching any of `names`.
    fn find(&self, names: &[&'static str]) -> Result<usize, DataError> {
        names
            .iter()
            .find_map(|name| self.headers.iter().position(|h| h == *name))
            .ok_or(DataError::MissingColumn(names[0]))
    }
}

fn field<'r>(record: &'r StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("")
}

fn number(record: &StringRecord, idx: usize, column: &'static str) -> Result<f64, DataError> {
    let raw = field(record, idx);
    raw.parse::<f64>().map_err(|_| DataError::InvalidNumber {
        line: record.position().map_or(0, |p| p.line()),
        column,
        value: raw.to_string(),
    })
}

/// Read bars, sorted and de-duplicated by timestamp.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let cols = Columns::new(rdr.headers()?);
    let dt = cols.find(&["datetime", "date", "timestamp"])?;
    let open = cols.find(&["open"])?;
    let high = cols.find(&["high"])?;
    let low = cols.find(&["low"])?;
    let close = cols.find(&["close"])?;

    let mut bars = Vec::new();
    for record in rdr.records() {
        let record = record?;
        bars.push(Bar::new(
            parse_datetime(field(&record, dt))?,
            number(&record, open, "open")?,
            number(&record, high, "high")?,
            number(&record, low, "low")?,
            number(&record, close, "close")?,
        ));
    }
    Ok(normalize_bars(bars))
}

pub fn read_bars_file(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = File::open(path).map_err(|e| DataError::io(path, e))?;
    read_bars(file)
}

pub fn write_bars<W: Write>(writer: W, bars: &[Bar]) -> Result<(), DataError> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(["datetime", "open", "high", "low", "close"])?;
    for bar in bars {
        wtr.write_record([
            format_datetime(bar.timestamp),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
        ])?;
    }
    wtr.flush().map_err(|e| DataError::io("<csv writer>", e))?;
    Ok(())
}

/// Read one direction's signal file.
///
/// Older files name the EMA columns after their periods (`EMA8`, `EMA21`);
/// both spellings are accepted.
pub fn read_signals<R: Read>(
    reader: R,
    direction: Direction,
) -> Result<Vec<CrossEvent>, DataError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let cols = Columns::new(rdr.headers()?);
    let dt = cols.find(&["datetime"])?;
    let close = cols.find(&["close"])?;
    let fast = cols.find(&["ema_fast", "ema8"])?;
    let slow = cols.find(&["ema_slow", "ema21"])?;
    let angle = cols.find(&["angle_degrees"])?;

    let mut events = Vec::new();
    for record in rdr.records() {
        let record = record?;
        events.push(CrossEvent {
            timestamp: parse_datetime(field(&record, dt))?,
            price: number(&record, close, "close")?,
            direction,
            angle_degrees: number(&record, angle, "angle_degrees")?,
            ema_fast: number(&record, fast, "ema_fast")?,
            ema_slow: number(&record, slow, "ema_slow")?,
        });
    }
    Ok(events)
}

pub fn read_signals_file(path: &Path, direction: Direction) -> Result<Vec<CrossEvent>, DataError> {
    let file = File::open(path).map_err(|e| DataError::io(path, e))?;
    read_signals(file, direction)
}

pub fn write_signals<W: Write>(writer: W, events: &[CrossEvent]) -> Result<(), DataError> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(["datetime", "close", "ema_fast", "ema_slow", "angle_degrees"])?;
    for e in events {
        wtr.write_record([
            format_datetime(e.timestamp),
            e.price.to_string(),
            e.ema_fast.to_string(),
            e.ema_slow.to_string(),
            e.angle_degrees.to_string(),
        ])?;
    }
    wtr.flush().map_err(|e| DataError::io("<csv writer>", e))?;
    Ok(())
}

pub fn write_signals_file(path: &Path, events: &[CrossEvent]) -> Result<(), DataError> {
    let file = File::create(path).map_err(|e| DataError::io(path, e))?;
    write_signals(file, events)
}

/// One row of `all_signals.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub symbol: String,
    pub direction: Direction,
    pub datetime: String,
    pub close: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub angle_degrees: f64,
}

impl AggregateRow {
    pub fn new(symbol: &str, event: &CrossEvent) -> Self {
        Self {
            symbol: symbol.to_string(),
            direction: event.direction,
            datetime: format_datetime(event.timestamp),
            close: event.price,
            ema_fast: event.ema_fast,
            ema_slow: event.ema_slow,
            angle_degrees: event.angle_degrees,
        }
    }

    pub fn timestamp(&self) -> Result<NaiveDateTime, DataError> {
        parse_datetime(&self.datetime)
    }
}

/// Write aggregate rows newest first. Ties keep their input order.
pub fn write_aggregate<W: Write>(writer: W, rows: &[AggregateRow]) -> Result<(), DataError> {
    let mut keyed = rows
        .iter()
        .map(|row| Ok((row.timestamp()?, row)))
        .collect::<Result<Vec<_>, DataError>>()?;
    keyed.sort_by(|a, b| b.0.cmp(&a.0));

    let mut wtr = WriterBuilder::new().from_writer(writer);
    for (_, row) in keyed {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| DataError::io("<csv writer>", e))?;
    Ok(())
}

pub fn read_aggregate<R: Read>(reader: R) -> Result<Vec<AggregateRow>, DataError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// `trend_signals_20250102.csv`
pub fn trend_signal_file_name(date: NaiveDate) -> String {
    format!("trend_signals_{}.csv", date.format("%Y%m%d"))
}

/// One confirmed entry in a daily trend-signal file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSignalRow {
    pub symbol: String,
    pub datetime: String,
    /// `LONG` or `SHORT`.
    #[serde(rename = "type")]
    pub kind: String,
    pub price: f64,
    pub reason: String,
}

impl TrendSignalRow {
    pub fn new(symbol: &str, entry: &EntrySignal, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.to_string(),
            datetime: format_datetime(entry.timestamp),
            kind: entry.side.to_string().to_ascii_uppercase(),
            price: entry.price,
            reason: reason.into(),
        }
    }
}

/// Append rows to `path`. The header is written only when the file is new
/// or empty.
pub fn append_trend_signals(path: &Path, rows: &[TrendSignalRow]) -> Result<(), DataError> {
    if rows.is_empty() {
        return Ok(());
    }
    let is_new = std::fs::metadata(path).map_or(true, |m| m.len() == 0);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DataError::io(path, e))?;
    let mut wtr = WriterBuilder::new().has_headers(is_new).from_writer(file);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| DataError::io(path, e))?;
    Ok(())
}

pub fn read_trend_signals<R: Read>(reader: R) -> Result<Vec<TrendSignalRow>, DataError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
