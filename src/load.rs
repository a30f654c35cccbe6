// src/load.rs

use arrow::csv::WriterBuilder;
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::info;

use crate::{
    error::{EtlError, Result},
    table::RecipientTable,
};

/// On-disk format of the cleaned table, chosen from the destination's
/// extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => OutputFormat::Parquet,
            _ => OutputFormat::Csv,
        }
    }
}

/// Write `table` to `dest`: comma-separated with a header row and no index
/// column, or Parquet when `dest` ends in `.parquet`.
///
/// The file is written next to `dest` first and renamed over it, so a
/// failed run never leaves a truncated table behind.
#[tracing::instrument(level = "info", skip(table, dest), fields(output = %dest.as_ref().display(), rows = table.len()))]
pub fn write_table<P: AsRef<Path>>(table: &RecipientTable, dest: P) -> Result<()> {
    let dest = dest.as_ref();
    let format = OutputFormat::from_path(dest);

    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| EtlError::io(&dir, e))?;

    let file_name = dest
        .file_name()
        .ok_or_else(|| EtlError::io(dest, io::Error::other("destination has no file name")))?;
    let tmp_path = dir.join(format!(".{}.tmp", file_name.to_string_lossy()));

    let written = write_format(table, &tmp_path, format)
        .and_then(|()| fs::rename(&tmp_path, dest));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(EtlError::io(dest, e));
    }

    info!(?format, "cleaned data saved at {}", dest.display());
    Ok(())
}

fn write_format(table: &RecipientTable, path: &Path, format: OutputFormat) -> io::Result<()> {
    let batch = table.to_record_batch().map_err(io::Error::other)?;
    let file = File::create(path)?;

    match format {
        OutputFormat::Csv => {
            let mut out = BufWriter::new(file);
            {
                let mut writer = WriterBuilder::new().with_header(true).build(&mut out);
                writer.write(&batch).map_err(io::Error::other)?;
            }
            out.flush()?;
        }
        OutputFormat::Parquet => {
            let props = WriterProperties::builder()
                .set_compression(Compression::SNAPPY)
                .build();
            let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
                .map_err(io::Error::other)?;
            writer.write(&batch).map_err(io::Error::other)?;
            writer.close().map_err(io::Error::other)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{RecipientRow, COLUMNS};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    fn sample() -> RecipientTable {
        RecipientTable::new(vec![
            RecipientRow {
                iso3: "USA".into(),
                recipient_budget: Some(1500.5),
                recipient_expense: None,
                sdg_code: "5".into(),
                sdg_name: Some("Gender equality".into()),
                country: Some("United States".into()),
                capital: "Washington D.C.".into(),
                region: "Americas".into(),
                continents: "North America".into(),
            },
            RecipientRow {
                iso3: "KEN".into(),
                recipient_budget: Some(20.0),
                recipient_expense: Some(7.25),
                sdg_code: "1".into(),
                sdg_name: Some("No poverty, everywhere".into()),
                country: Some("Kenya".into()),
                capital: "Nairobi".into(),
                region: "Africa".into(),
                continents: "Africa".into(),
            },
        ])
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a/b.csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_path(Path::new("a/b.PARQUET")),
            OutputFormat::Parquet
        );
        assert_eq!(OutputFormat::from_path(Path::new("noext")), OutputFormat::Csv);
    }

    #[test]
    fn test_csv_has_header_and_rows() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let dest = dir.path().join("nested").join("cleaned.csv");
        write_table(&sample(), &dest)?;

        let mut rdr = csv::Reader::from_path(&dest)?;
        let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
        assert_eq!(headers, COLUMNS);

        let records: Vec<csv::StringRecord> =
            rdr.records().collect::<std::result::Result<_, _>>()?;
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "USA");
        assert_eq!(records[0][1].parse::<f64>()?, 1500.5);
        assert_eq!(&records[0][2], "");
        assert_eq!(&records[1][4], "No poverty, everywhere");
        assert_eq!(&records[1][5], "Kenya");

        let leftovers: Vec<_> = fs::read_dir(dest.parent().unwrap())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_table_still_has_header() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let dest = dir.path().join("cleaned.csv");
        write_table(&RecipientTable::default(), &dest)?;

        let content = fs::read_to_string(&dest)?;
        assert_eq!(content.trim_end(), COLUMNS.join(","));
        Ok(())
    }

    #[test]
    fn test_rewrite_is_byte_identical() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let dest = dir.path().join("cleaned.csv");
        write_table(&sample(), &dest)?;
        let first = fs::read(&dest)?;
        write_table(&sample(), &dest)?;
        assert_eq!(first, fs::read(&dest)?);
        Ok(())
    }

    #[test]
    fn test_parquet_output() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let dest = dir.path().join("cleaned.parquet");
        write_table(&sample(), &dest)?;

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&dest)?)?.build()?;
        let rows: usize = reader
            .map(|b| b.map(|b| b.num_rows()))
            .sum::<std::result::Result<usize, _>>()?;
        assert_eq!(rows, 2);
        Ok(())
    }

    #[test]
    fn test_unwritable_destination_is_io_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let err = write_table(&sample(), blocker.join("cleaned.csv")).unwrap_err();
        assert!(matches!(err, EtlError::Io { .. }), "{:?}", err);
    }
}
