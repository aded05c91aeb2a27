//! CSV reading and writing shared by the input table, the settings file, and
//! the alias source.
//!
//! - Readers never treat the first record as special; callers decide what the
//!   header is.
//! - Fields are read as bytes and decoded as UTF-8 through `encoding_rs`, so a
//!   bad byte sequence is reported with its record number.
//! - Writers terminate records with CRLF on Windows and LF elsewhere.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use csv::{QuoteStyle, Terminator};
use encoding_rs::UTF_8;

pub const SETTINGS_EXTENSION: &str = "settings";

/// Path of the persisted decisions for `input`: the input path with
/// `.settings` appended (`specimens.csv` -> `specimens.csv.settings`).
pub fn settings_path(input: &Path) -> PathBuf {
    let mut raw = input.as_os_str().to_owned();
    raw.push(".");
    raw.push(SETTINGS_EXTENSION);
    PathBuf::from(raw)
}

pub fn open_csv_reader<R>(reader: R, flexible: bool) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(b',')
        .double_quote(true)
        .quoting(true)
        .flexible(flexible);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, flexible: bool) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = Box::new(BufReader::new(
        File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
    ));
    Ok(open_csv_reader(reader, flexible))
}

pub fn decode_record(record: &csv::ByteRecord) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| {
            let (text, had_errors) = UTF_8.decode_without_bom_handling(field);
            if had_errors {
                Err(anyhow!("Field is not valid UTF-8"))
            } else {
                Ok(text.into_owned())
            }
        })
        .collect()
}

/// Reads every record of `reader`. Field counts are not checked here unless
/// the reader was built non-flexible.
pub fn read_all_records<R>(reader: &mut csv::Reader<R>) -> Result<Vec<Vec<String>>>
where
    R: Read,
{
    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading record {}", idx + 1))?;
        let mut decoded =
            decode_record(&record).with_context(|| format!("Decoding record {}", idx + 1))?;
        if idx == 0
            && let Some(first) = decoded.first_mut()
            && first.starts_with('\u{feff}')
        {
            first.remove(0);
        }
        rows.push(decoded);
    }
    Ok(rows)
}

pub fn read_csv_file(path: &Path, flexible: bool) -> Result<Vec<Vec<String>>> {
    let mut reader = open_csv_reader_from_path(path, flexible)?;
    read_all_records(&mut reader).with_context(|| format!("Reading CSV data from {path:?}"))
}

pub fn open_csv_writer<W>(writer: W, quote_style: QuoteStyle) -> csv::Writer<W>
where
    W: Write,
{
    let terminator = if cfg!(windows) {
        Terminator::CRLF
    } else {
        Terminator::Any(b'\n')
    };
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(b',')
        .quote_style(quote_style)
        .double_quote(true)
        .flexible(true)
        .terminator(terminator);
    builder.from_writer(writer)
}

pub fn create_csv_writer(path: &Path, quote_style: QuoteStyle) -> Result<csv::Writer<Box<dyn Write>>> {
    let file: Box<dyn Write> = Box::new(BufWriter::new(
        File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
    ));
    Ok(open_csv_writer(file, quote_style))
}

pub fn write_csv<W>(writer: &mut csv::Writer<W>, header: &[String], rows: &[Vec<String>]) -> Result<()>
where
    W: Write,
{
    writer
        .write_record(header.iter())
        .context("Writing output headers")?;
    for (idx, row) in rows.iter().enumerate() {
        writer
            .write_record(row.iter())
            .with_context(|| format!("Writing output row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output writer")?;
    Ok(())
}

pub fn write_csv_file(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = create_csv_writer(path, QuoteStyle::Necessary)?;
    write_csv(&mut writer, header, rows).with_context(|| format!("Writing CSV data to {path:?}"))
}
