//! The shared Excel workbook: a header row plus one row per submission on the
//! first sheet.
//!
//! Every append reads the whole file, adds a row and rewrites the file. The
//! store takes no locks; two concurrent appends can lose one of the rows.
//! Callers that may append concurrently go through
//! [`WorkbookWriter`](super::writer::WorkbookWriter).
//!
//! Cells hold plain values so the sheet stays readable in a spreadsheet. A
//! value a cell cannot carry exactly (objects, nulls, empty strings, floats,
//! lists that do not split back) is also kept as JSON on a hidden second
//! sheet, one line per data row, and takes precedence on read.

use std::{
    fs, io,
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::{Map, Number, Value};

use crate::{
    error::{StoreError, StoreResult},
    log_debug, log_info, log_warn,
    models::{HealthRecord, LIST_FIELDS},
};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "health_intake::workbook";

pub const WORKBOOK_FILE_NAME: &str = "health_data.xlsx";
pub const WORKBOOK_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const SHEET_NAME: &str = "HealthData";
pub const EXACT_VALUES_SHEET_NAME: &str = "ExactValues";
pub const PROCESSED_FILE_NAME: &str = "processed_health_data.xlsx";
pub const PROCESSED_SHEET_NAME: &str = "ProcessedData";

const LIST_SEPARATOR: &str = ",";
// Integers above this lose precision as f64 cells.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// The first sheet, decoded. A `Value::Null` cell is blank.
///
/// `exact[i]` holds the JSON values of data row `i` whose cells are lossy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub exact: Vec<Option<Map<String, Value>>>,
}

impl Sheet {
    pub fn with_header(header: Vec<String>) -> Self {
        Self {
            header,
            ..Self::default()
        }
    }

    /// Header in first-seen key order across all rows.
    pub fn from_rows(rows: &[Map<String, Value>]) -> Self {
        let mut header: Vec<String> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !header.contains(key) {
                    header.push(key.clone());
                }
            }
        }
        let mut sheet = Self::with_header(header);
        for row in rows {
            sheet.push(row);
        }
        sheet
    }

    /// Lays the values out in header order. Keys the header does not know
    /// about are dropped; header keys the row lacks stay blank.
    pub fn push(&mut self, fields: &Map<String, Value>) {
        let mut exact = Map::new();
        let row = self
            .header
            .iter()
            .map(|key| match fields.get(key) {
                Some(value) => {
                    if !cell_is_exact(key, value) {
                        exact.insert(key.clone(), value.clone());
                    }
                    to_cell(key, value)
                }
                None => Value::Null,
            })
            .collect();

        self.exact.resize(self.rows.len(), None);
        self.rows.push(row);
        self.exact.push((!exact.is_empty()).then_some(exact));
    }

    /// Re-keys every data row by the header. Blank cells are left out.
    fn keyed_rows(&self) -> impl Iterator<Item = Map<String, Value>> + '_ {
        self.rows.iter().enumerate().map(move |(index, row)| {
            let exact = self.exact.get(index).and_then(Option::as_ref);
            self.header
                .iter()
                .zip(row)
                .filter(|(key, _)| !key.is_empty())
                .filter_map(|(key, cell)| {
                    if let Some(value) = exact.and_then(|exact| exact.get(key)) {
                        return Some((key.clone(), value.clone()));
                    }
                    (!cell.is_null()).then(|| (key.clone(), from_cell(key, cell)))
                })
                .collect()
        })
    }
}

pub struct WorkbookStore {
    path: PathBuf,
}

impl WorkbookStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store for `<dir>/health_data.xlsx`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(WORKBOOK_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Idempotently creates the directory the workbook lives in.
    pub fn ensure_storage_ready(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create workbook directory {}", parent.display())
            })?;
        }
        Ok(())
    }

    /// Appends one row for `record`, creating the workbook on first use with
    /// the record's keys as the header row.
    pub fn append_row(&self, record: &HealthRecord) -> StoreResult<()> {
        let fields = record
            .to_fields()
            .with_context(|| format!("failed to flatten record {}", record.id))?;

        let mut sheet = match self.load_sheet()? {
            Some(sheet) if !sheet.header.is_empty() => sheet,
            _ => {
                log_info!("Creating workbook at {}", self.path.display());
                Sheet::with_header(fields.keys().cloned().collect())
            }
        };
        sheet.push(&fields);

        let bytes = encode_sheet(&sheet, SHEET_NAME)?;
        self.ensure_storage_ready()?;
        fs::write(&self.path, bytes)
            .with_context(|| format!("failed to write workbook {}", self.path.display()))?;

        log_debug!(
            "Appended record {} as row {} of {}",
            record.id,
            sheet.rows.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Best-effort read of every row. A missing or unreadable workbook yields
    /// an empty list; rows that do not form a record are skipped.
    pub fn read_all(&self) -> Vec<HealthRecord> {
        let sheet = match self.load_sheet() {
            Ok(Some(sheet)) => sheet,
            Ok(None) => return Vec::new(),
            Err(err) => {
                log_warn!("Error reading workbook {}: {err:#}", self.path.display());
                return Vec::new();
            }
        };

        sheet
            .keyed_rows()
            .enumerate()
            .filter(|(_, fields)| !fields.is_empty())
            .filter_map(|(index, fields)| match HealthRecord::from_fields(fields) {
                Ok(record) => Some(record),
                Err(err) => {
                    log_warn!("Skipping workbook row {}: {err}", index + 2);
                    None
                }
            })
            .collect()
    }

    /// The workbook file as stored, for download.
    pub fn read_raw(&self) -> StoreResult<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::not_found("workbook"))
            }
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("failed to read workbook {}", self.path.display()))
                .into()),
        }
    }

    /// Loads the first sheet, or `None` when no workbook exists yet.
    pub fn load_sheet(&self) -> StoreResult<Option<Sheet>> {
        let bytes = match self.read_raw() {
            Ok(bytes) => bytes,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err),
        };
        let sheet = decode_sheet(bytes)
            .with_context(|| format!("failed to parse workbook {}", self.path.display()))?;
        Ok(Some(sheet))
    }
}

/// Whether the cell written for `value` reads back as the same value.
fn cell_is_exact(key: &str, value: &Value) -> bool {
    match value {
        Value::String(text) => !text.is_empty(),
        Value::Bool(_) => true,
        Value::Number(number) => match (number.as_i64(), number.as_u64()) {
            (Some(int), _) => (int as f64).abs() < MAX_EXACT_INTEGER,
            (None, Some(int)) => (int as f64) < MAX_EXACT_INTEGER,
            _ => false,
        },
        Value::Array(items) if LIST_FIELDS.contains(&key) => {
            !items.is_empty()
                && items.iter().all(|item| {
                    item.as_str()
                        .is_some_and(|tag| !tag.is_empty() && !tag.contains(LIST_SEPARATOR))
                })
        }
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

fn to_cell(key: &str, value: &Value) -> Value {
    match value {
        Value::Array(items) if LIST_FIELDS.contains(&key) && items.iter().all(Value::is_string) => {
            let tags: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            Value::String(tags.join(LIST_SEPARATOR))
        }
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        scalar => scalar.clone(),
    }
}

fn from_cell(key: &str, cell: &Value) -> Value {
    match cell {
        Value::String(joined) if LIST_FIELDS.contains(&key) => Value::Array(
            joined
                .split(LIST_SEPARATOR)
                .map(|tag| Value::String(tag.to_string()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Serializes `sheet` as a workbook whose first sheet is named `name`.
pub fn encode_sheet(sheet: &Sheet, name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(name)?;
    for (col, title) in sheet.header.iter().enumerate() {
        worksheet.write_string(0, column(col)?, title)?;
    }
    for (index, row) in sheet.rows.iter().enumerate() {
        let row_num = row_number(index)?;
        for (col, cell) in row.iter().enumerate() {
            write_cell(worksheet, row_num, column(col)?, cell)?;
        }
    }

    if sheet.exact.iter().any(Option::is_some) {
        let values = workbook.add_worksheet();
        values.set_name(EXACT_VALUES_SHEET_NAME)?;
        values.set_hidden(true);
        values.write_string(0, 0, "values")?;
        for (index, exact) in sheet.exact.iter().enumerate() {
            if let Some(exact) = exact {
                let text = serde_json::to_string(exact)?;
                values.write_string(row_number(index)?, 0, text)?;
            }
        }
    }

    workbook
        .save_to_buffer()
        .context("failed to serialize workbook")
}

/// A one-sheet workbook of `rows` for download. The header is every key in
/// first-seen order; no exact values are kept.
pub fn export_rows(rows: &[Map<String, Value>], name: &str) -> Result<Vec<u8>> {
    let mut sheet = Sheet::from_rows(rows);
    sheet.exact.clear();
    encode_sheet(&sheet, name)
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Value) -> Result<()> {
    match cell {
        Value::Null => {}
        Value::String(text) if text.is_empty() => {}
        Value::String(text) => {
            worksheet.write_string(row, col, text)?;
        }
        Value::Bool(flag) => {
            worksheet.write_boolean(row, col, *flag)?;
        }
        Value::Number(number) => match number.as_f64() {
            Some(value) => {
                worksheet.write_number(row, col, value)?;
            }
            None => {
                worksheet.write_string(row, col, number.to_string())?;
            }
        },
        Value::Array(_) | Value::Object(_) => {
            worksheet.write_string(row, col, cell.to_string())?;
        }
    }
    Ok(())
}

fn column(index: usize) -> Result<u16> {
    u16::try_from(index).with_context(|| format!("column {index} out of range"))
}

/// Sheet row of data row `index`, below the header.
fn row_number(index: usize) -> Result<u32> {
    u32::try_from(index + 1).context("workbook row count overflow")
}

fn decode_sheet(bytes: Vec<u8>) -> Result<Sheet> {
    let mut workbook: Xlsx<Cursor<Vec<u8>>> =
        open_workbook_from_rs(Cursor::new(bytes)).context("not an xlsx workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no sheets")?
        .context("failed to read first sheet")?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(cells) => cells.iter().map(header_name).collect(),
        None => return Ok(Sheet::default()),
    };
    let rows = rows
        .map(|cells| cells.iter().map(cell_value).collect())
        .collect();

    let exact_index = workbook
        .sheet_names()
        .iter()
        .position(|name| name == EXACT_VALUES_SHEET_NAME);
    let exact = match exact_index {
        Some(index) => {
            let range = workbook
                .worksheet_range_at(index)
                .context("exact values sheet vanished")?
                .context("failed to read exact values sheet")?;
            decode_exact(&range)
        }
        None => Vec::new(),
    };

    Ok(Sheet {
        header,
        rows,
        exact,
    })
}

fn decode_exact(range: &Range<Data>) -> Vec<Option<Map<String, Value>>> {
    range
        .rows()
        .skip(1)
        .map(|cells| match cells.first() {
            Some(Data::String(text)) => match serde_json::from_str(text) {
                Ok(values) => Some(values),
                Err(err) => {
                    log_warn!("Ignoring unreadable exact values: {err}");
                    None
                }
            },
            _ => None,
        })
        .collect()
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::String(name) => name.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(text) if text.is_empty() => Value::Null,
        Data::String(text) => Value::String(text.clone()),
        Data::Bool(flag) => Value::Bool(*flag),
        Data::Int(value) => Value::from(*value),
        Data::Float(value) => number_value(*value),
        other => Value::String(other.to_string()),
    }
}

fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::sample_record;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> WorkbookStore {
        WorkbookStore::in_dir(dir.path().join("data"))
    }

    #[test]
    fn first_append_creates_workbook_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let record = sample_record("r1");

        store.append_row(&record).unwrap();

        assert!(store.path().is_file());
        assert_eq!(store.read_all(), vec![record]);
    }

    #[test]
    fn header_follows_first_record_key_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut first = sample_record("r1");
        first.extra.insert("height".into(), json!("175"));

        store.append_row(&first).unwrap();

        let sheet = store.load_sheet().unwrap().unwrap();
        let expected: Vec<String> = first.to_fields().unwrap().keys().cloned().collect();
        assert_eq!(sheet.header, expected);
        assert_eq!(sheet.header.last().map(String::as_str), Some("height"));
        assert_eq!(sheet.rows[0][0], json!("r1"));
    }

    #[test]
    fn later_rows_are_appended_in_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        for id in ["a", "b", "c"] {
            store.append_row(&sample_record(id)).unwrap();
        }

        let ids: Vec<String> = store.read_all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_keys_of_later_records_do_not_widen_header() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append_row(&sample_record("a")).unwrap();

        let mut second = sample_record("b");
        second.extra.insert("campaign".into(), json!("spring"));
        store.append_row(&second).unwrap();

        let sheet = store.load_sheet().unwrap().unwrap();
        assert!(!sheet.header.iter().any(|key| key == "campaign"));
        let rows = store.read_all();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].extra.is_empty());
    }

    #[test]
    fn list_fields_are_joined_in_cells() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut record = sample_record("a");
        record.family_history = vec!["Diabetes".into(), "Heart disease".into()];
        store.append_row(&record).unwrap();

        let sheet = store.load_sheet().unwrap().unwrap();
        let col = sheet
            .header
            .iter()
            .position(|key| key == "familyHistory")
            .unwrap();
        assert_eq!(sheet.rows[0][col], json!("Diabetes,Heart disease"));
        assert_eq!(store.read_all()[0].family_history, record.family_history);
    }

    #[test]
    fn extension_scalars_keep_their_types() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut record = sample_record("a");
        record.extra.insert("visits".into(), json!(3));
        record.extra.insert("score".into(), json!(7.25));
        record.extra.insert("consented".into(), json!(true));
        store.append_row(&record).unwrap();

        let back = &store.read_all()[0];
        assert_eq!(back.extra["visits"], json!(3));
        assert_eq!(back.extra["score"], json!(7.25));
        assert_eq!(back.extra["consented"], json!(true));
    }

    #[test]
    fn structured_and_empty_values_survive_the_workbook() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut record = sample_record("a");
        record.exercise_types = Some(Vec::new());
        record.family_history = vec!["Cancer, breast".into()];
        record.extra.insert("address".into(), json!({"city": "Oslo", "zip": 150}));
        record.extra.insert("devices".into(), json!(["watch", 2, null]));
        record.extra.insert("referrer".into(), json!(null));
        record.extra.insert("notes".into(), json!(""));
        record.extra.insert("ratio".into(), json!(3.0));
        record.extra.insert("big".into(), json!(9_007_199_254_740_993_u64));
        store.append_row(&record).unwrap();
        store.append_row(&sample_record("b")).unwrap();

        let back = store.read_all();
        assert_eq!(back[0], record);
        assert!(back[0].extra["ratio"].is_f64());
        assert_eq!(back[1], sample_record("b"));
    }

    #[test]
    fn plain_rows_write_no_exact_values() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append_row(&sample_record("a")).unwrap();

        let sheet = store.load_sheet().unwrap().unwrap();
        assert!(sheet.exact.iter().all(Option::is_none));
    }

    #[test]
    fn workbook_without_exact_values_reads_cells() {
        let mut sheet = Sheet::with_header(vec!["id".into(), "notes".into()]);
        sheet.rows.push(vec![json!("a"), json!("kept")]);
        sheet.exact.push(None);
        let bytes = encode_sheet(&sheet, SHEET_NAME).unwrap();

        let decoded = decode_sheet(bytes).unwrap();
        assert_eq!(decoded.exact, Vec::<Option<Map<String, Value>>>::new());
        let rows: Vec<_> = decoded.keyed_rows().collect();
        assert_eq!(rows[0]["notes"], json!("kept"));
    }

    #[test]
    fn export_header_is_union_of_keys() {
        let rows = vec![
            json!({"id": "a", "age": 34.0}).as_object().unwrap().clone(),
            json!({"id": "b", "bmi": 22.9, "tags": ["x", "y"]}).as_object().unwrap().clone(),
        ];

        let sheet = decode_sheet(export_rows(&rows, PROCESSED_SHEET_NAME).unwrap()).unwrap();
        assert_eq!(sheet.header, vec!["id", "age", "bmi", "tags"]);
        assert_eq!(sheet.rows[0], vec![json!("a"), json!(34), Value::Null, Value::Null]);
        assert_eq!(sheet.rows[1][2], json!(22.9));
        assert_eq!(sheet.rows[1][3], json!(r#"["x","y"]"#));
        assert!(sheet.exact.is_empty());
    }

    #[test]
    fn read_all_without_workbook_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store_in(&dir).read_all().is_empty());
    }

    #[test]
    fn read_raw_without_workbook_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = store_in(&dir).read_raw().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn read_raw_returns_stored_bytes() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append_row(&sample_record("a")).unwrap();

        let bytes = store.read_raw().unwrap();
        assert_eq!(bytes, fs::read(store.path()).unwrap());
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn corrupt_workbook_reads_empty_but_refuses_appends() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.ensure_storage_ready().unwrap();
        fs::write(store.path(), b"definitely not a spreadsheet").unwrap();

        assert!(store.read_all().is_empty());
        assert!(matches!(
            store.append_row(&sample_record("a")),
            Err(StoreError::Storage(_))
        ));
        // the corrupt file is left as it was
        assert_eq!(
            fs::read(store.path()).unwrap(),
            b"definitely not a spreadsheet"
        );
    }
}
