pub mod records;
pub mod workbook;
pub mod writer;

pub use records::RecordStore;
pub use workbook::{
    export_rows, WorkbookStore, PROCESSED_FILE_NAME, PROCESSED_SHEET_NAME, WORKBOOK_CONTENT_TYPE,
    WORKBOOK_FILE_NAME,
};
pub use writer::WorkbookWriter;
