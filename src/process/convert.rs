use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};
use tracing::{debug, info, instrument, trace};

use super::ConvertError;

/// Namespace of the FIRDS reference data delta report (`auth.036.001.02`).
pub const AUTH036_NS: &[u8] = b"urn:iso:std:iso:20022:tech:xsd:auth.036.001.02";

/// Output columns, in order.
pub const CSV_HEADER: [&str; 6] = [
    "FinInstrmGnlAttrbts.Id",
    "FinInstrmGnlAttrbts.FullNm",
    "FinInstrmGnlAttrbts.ClssfctnTp",
    "FinInstrmGnlAttrbts.CmmdtyDerivInd",
    "FinInstrmGnlAttrbts.NtnlCcy",
    "Issr",
];

const RECORD: &[u8] = b"FinInstrm";
const GENERAL_ATTRIBUTES: &[u8] = b"FinInstrmGnlAttrbts";

/// One projected field of an instrument record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    FullNm,
    ClssfctnTp,
    CmmdtyDerivInd,
    NtnlCcy,
    Issr,
}

impl Field {
    /// Column order of the CSV.
    pub const ALL: [Field; 6] = [
        Field::Id,
        Field::FullNm,
        Field::ClssfctnTp,
        Field::CmmdtyDerivInd,
        Field::NtnlCcy,
        Field::Issr,
    ];

    fn from_local_name(name: &[u8]) -> Option<Field> {
        match name {
            b"Id" => Some(Field::Id),
            b"FullNm" => Some(Field::FullNm),
            b"ClssfctnTp" => Some(Field::ClssfctnTp),
            b"CmmdtyDerivInd" => Some(Field::CmmdtyDerivInd),
            b"NtnlCcy" => Some(Field::NtnlCcy),
            b"Issr" => Some(Field::Issr),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        CSV_HEADER[self as usize]
    }

    /// Every field but the issuer lives under `FinInstrmGnlAttrbts`.
    fn is_general(self) -> bool {
        self != Field::Issr
    }
}

/// Values collected for the record being parsed. Emptied on every flush
/// and at the start of every `FinInstrm`.
#[derive(Debug, Default)]
struct RecordAccumulator {
    values: [Option<String>; 6],
}

impl RecordAccumulator {
    fn set(&mut self, field: Field, value: String) {
        self.values[field as usize] = Some(value);
    }

    fn clear(&mut self) {
        self.values = Default::default();
    }

    fn take_row(&mut self, record: u64) -> Result<Vec<String>, ConvertError> {
        let values = std::mem::take(&mut self.values);
        let mut row = Vec::with_capacity(values.len());
        for (field, value) in Field::ALL.into_iter().zip(values) {
            match value {
                Some(v) => row.push(v),
                None => {
                    return Err(ConvertError::MissingField {
                        field: field.column(),
                        record,
                    })
                }
            }
        }
        Ok(row)
    }
}

/// Stream `input` and write one CSV row per instrument record to `output`,
/// header first. A row is emitted when the issuer closes; every other field
/// of that record must have been seen by then. A `FinInstrm` that closes
/// without having emitted a row fails on its first missing field.
/// Returns the number of rows.
pub fn convert_xml_to_csv<R: BufRead, W: Write>(input: R, output: W) -> Result<u64> {
    let mut reader = NsReader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(CSV_HEADER).context("writing csv header")?;
    trace!("header row written");

    let mut buf = Vec::new();
    let mut acc = RecordAccumulator::default();
    let mut in_general = false;
    let mut emitted = false;
    let mut capturing: Option<Field> = None;
    let mut text = String::new();
    let mut rows = 0u64;

    loop {
        let (ns, event) = reader
            .read_resolved_event_into(&mut buf)
            .context("parsing dataset xml")?;
        let in_ns = matches!(ns, ResolveResult::Bound(n) if n.as_ref() == AUTH036_NS);

        // every record before the current one emitted a row, so this is its index
        let record = rows + 1;
        let mut complete: Option<Field> = None;

        match event {
            Event::Start(e) if in_ns => {
                let local = e.local_name();
                if local.as_ref() == RECORD {
                    acc.clear();
                    capturing = None;
                    in_general = false;
                    emitted = false;
                } else if local.as_ref() == GENERAL_ATTRIBUTES {
                    in_general = true;
                } else if let Some(field) = Field::from_local_name(local.as_ref()) {
                    if field.is_general() == in_general {
                        capturing = Some(field);
                        text.clear();
                    }
                }
            }
            Event::Empty(e) if in_ns => {
                if let Some(field) = Field::from_local_name(e.local_name().as_ref()) {
                    if field.is_general() == in_general {
                        acc.set(field, String::new());
                        complete = Some(field);
                    }
                }
            }
            Event::Text(t) if capturing.is_some() => {
                text.push_str(&t.unescape()?);
            }
            Event::CData(c) if capturing.is_some() => {
                text.push_str(std::str::from_utf8(&c).context("decoding cdata")?);
            }
            Event::End(e) if in_ns => {
                let local = e.local_name();
                if local.as_ref() == RECORD {
                    if !emitted {
                        acc.take_row(record)?;
                    }
                } else if local.as_ref() == GENERAL_ATTRIBUTES {
                    in_general = false;
                } else if let Some(field) = capturing
                    .filter(|f| Field::from_local_name(local.as_ref()) == Some(*f))
                {
                    capturing = None;
                    acc.set(field, std::mem::take(&mut text));
                    complete = Some(field);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();

        if complete == Some(Field::Issr) {
            writer.write_record(acc.take_row(record)?)?;
            rows += 1;
            emitted = true;
            if rows % 100_000 == 0 {
                debug!(rows, "rows written");
            }
        }
    }

    writer.flush().context("flushing csv")?;
    Ok(rows)
}

/// Convert the XML at `xml_path` into a fresh CSV at `csv_path`.
#[instrument(level = "info", skip_all, fields(xml = %xml_path.display(), csv = %csv_path.display()))]
pub fn convert_file(xml_path: &Path, csv_path: &Path) -> Result<u64> {
    let input = BufReader::new(
        File::open(xml_path).with_context(|| format!("opening {}", xml_path.display()))?,
    );
    let output = BufWriter::new(
        File::create(csv_path).with_context(|| format!("creating {}", csv_path.display()))?,
    );
    info!("Parsing {}...", xml_path.display());
    let rows = convert_xml_to_csv(input, output)?;
    info!(rows, "{} rows written to csv file {}", rows, csv_path.display());
    Ok(rows)
}
