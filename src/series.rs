use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

const NUM_FIELDS: usize = 3;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read csv from {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} has no header row")]
    MissingHeader { path: PathBuf },

    #[error("{path}:{line}: expected 3 fields, found {found}")]
    FieldCount {
        path: PathBuf,
        line: usize,
        found: usize,
    },

    #[error("{path}:{line}: {field:?} is not a number")]
    NotNumeric {
        path: PathBuf,
        line: usize,
        field: String,
    },

    #[error("{path}:{line}: size {size} is not a positive finite number")]
    NonPositiveSize {
        path: PathBuf,
        line: usize,
        size: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub size: f64,
    pub raw_rate: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRecord {
    pub name: String,
    pub samples: Vec<Sample>,
}

impl SeriesRecord {
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.samples.iter().map(|sample| (sample.size, sample.rate))
    }
}

pub fn read_series<P: AsRef<Path>>(path: P) -> Result<SeriesRecord, SeriesError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SeriesError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    parse_series(file, path)
}

// `path` only shows up in errors
pub fn parse_series<R: Read>(mut reader: R, path: &Path) -> Result<SeriesRecord, SeriesError> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|source| SeriesError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    // the csv reader skips empty lines, but an empty row is as malformed as
    // a short one
    if let Some(line) = find_empty_line(&content) {
        return Err(SeriesError::FieldCount {
            path: path.to_path_buf(),
            line,
            found: 0,
        });
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|source| csv_error(path, source))?,
        None => {
            return Err(SeriesError::MissingHeader {
                path: path.to_path_buf(),
            })
        }
    };
    check_field_count(&header, path)?;
    let name = header[2].to_owned();

    let mut samples = Vec::new();
    for record in records {
        let record = record.map_err(|source| csv_error(path, source))?;
        check_field_count(&record, path)?;

        let line = line_of(&record);
        let mut values = [0f64; NUM_FIELDS];
        for (value, field) in values.iter_mut().zip(record.iter()) {
            *value = field.parse().map_err(|_| SeriesError::NotNumeric {
                path: path.to_path_buf(),
                line,
                field: field.to_owned(),
            })?;
        }

        let [size, raw_rate, rate] = values;
        if !size.is_finite() || size <= 0.0 {
            return Err(SeriesError::NonPositiveSize {
                path: path.to_path_buf(),
                line,
                size,
            });
        }

        samples.push(Sample {
            size,
            raw_rate,
            rate,
        });
    }

    Ok(SeriesRecord { name, samples })
}

fn find_empty_line(content: &str) -> Option<usize> {
    let mut line = 1;
    let mut line_is_empty = true;
    let mut in_quotes = false;

    for byte in content.bytes() {
        match byte {
            b'"' => {
                in_quotes = !in_quotes;
                line_is_empty = false;
            }
            b'\n' if in_quotes => line += 1,
            b'\n' => {
                if line_is_empty {
                    return Some(line);
                }
                line += 1;
                line_is_empty = true;
            }
            b'\r' => {}
            _ => line_is_empty = false,
        }
    }

    None
}

fn check_field_count(record: &StringRecord, path: &Path) -> Result<(), SeriesError> {
    if record.len() != NUM_FIELDS {
        return Err(SeriesError::FieldCount {
            path: path.to_path_buf(),
            line: line_of(record),
            found: record.len(),
        });
    }
    Ok(())
}

fn line_of(record: &StringRecord) -> usize {
    record
        .position()
        .map(|position| position.line() as usize)
        .unwrap_or_default()
}

fn csv_error(path: &Path, source: csv::Error) -> SeriesError {
    SeriesError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<SeriesRecord, SeriesError> {
        parse_series(content.as_bytes(), Path::new("test.csv"))
    }

    #[test]
    fn reads_name_and_samples_in_file_order() {
        let record = parse("size,rate,Foo\n1024,0.5,0.9\n4096,0.6,0.95\n").unwrap();

        assert_eq!(record.name, "Foo");
        assert_eq!(
            record.samples,
            vec![
                Sample {
                    size: 1024.0,
                    raw_rate: 0.5,
                    rate: 0.9
                },
                Sample {
                    size: 4096.0,
                    raw_rate: 0.6,
                    rate: 0.95
                },
            ]
        );
        assert_eq!(
            record.points().collect::<Vec<_>>(),
            vec![(1024.0, 0.9), (4096.0, 0.95)]
        );
    }

    #[test]
    fn accepts_quotes_and_padding() {
        let record = parse("\"size\",\"rate\",\"Signalsmith (development)\"\n 1 , 2.5 , 1e-1 \n").unwrap();

        assert_eq!(record.name, "Signalsmith (development)");
        assert_eq!(record.points().collect::<Vec<_>>(), vec![(1.0, 0.1)]);
    }

    #[test]
    fn header_only_is_an_empty_series() {
        let record = parse("size,rate,Empty\n").unwrap();
        assert_eq!(record.name, "Empty");
        assert!(record.samples.is_empty());
    }

    #[test]
    fn empty_file_has_no_header() {
        assert!(matches!(parse(""), Err(SeriesError::MissingHeader { .. })));
    }

    #[test]
    fn wrong_field_counts_are_rejected() {
        assert!(matches!(
            parse("size,Foo\n1,2\n"),
            Err(SeriesError::FieldCount { found: 2, .. })
        ));

        let err = parse("size,rate,Foo\n1,2,3\n4,5\n").unwrap_err();
        assert!(matches!(
            err,
            SeriesError::FieldCount {
                line: 3,
                found: 2,
                ..
            }
        ));

        assert!(matches!(
            parse("size,rate,Foo\n1,2,3,4\n"),
            Err(SeriesError::FieldCount { found: 4, .. })
        ));
    }

    #[test]
    fn blank_rows_are_rejected() {
        assert!(matches!(
            parse("size,rate,Foo\n1,2,3\n\n4,5,6\n"),
            Err(SeriesError::FieldCount {
                line: 3,
                found: 0,
                ..
            })
        ));
        assert!(matches!(
            parse("size,rate,Foo\r\n1,2,3\r\n\r\n"),
            Err(SeriesError::FieldCount {
                line: 3,
                found: 0,
                ..
            })
        ));
        assert!(matches!(
            parse("\nsize,rate,Foo\n1,2,3\n"),
            Err(SeriesError::FieldCount { line: 1, .. })
        ));

        // a line break inside a quoted name is not an empty row
        let record = parse("size,rate,\"Foo\n\nBar\"\n1,2,3\n").unwrap();
        assert_eq!(record.name, "Foo\n\nBar");
        assert_eq!(record.samples.len(), 1);
    }

    #[test]
    fn non_numeric_fields_are_rejected() {
        let err = parse("size,rate,Foo\n1,2,3\n16,fast,0.5\n").unwrap_err();
        match err {
            SeriesError::NotNumeric { line, field, .. } => {
                assert_eq!(line, 3);
                assert_eq!(field, "fast");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn sizes_must_be_positive() {
        assert!(matches!(
            parse("size,rate,Foo\n0,1,1\n"),
            Err(SeriesError::NonPositiveSize { line: 2, .. })
        ));
        assert!(matches!(
            parse("size,rate,Foo\nNaN,1,1\n"),
            Err(SeriesError::NonPositiveSize { .. })
        ));
        assert!(matches!(
            parse("size,rate,Foo\n1,1,1\ninf,2,3\n"),
            Err(SeriesError::NonPositiveSize { line: 3, .. })
        ));
        assert!(matches!(
            parse("size,rate,Foo\ninfinity,2,3\n"),
            Err(SeriesError::NonPositiveSize { .. })
        ));
    }

    #[test]
    fn missing_file_fails_to_open() {
        let folder = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_series(folder.path().join("nope.csv")),
            Err(SeriesError::Open { .. })
        ));
    }
}
