//! Position sample table
//!
//! A small block of scalar run parameters followed by `(x, y, z, t)` rows
//! taken at a fixed sampling cadence.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::simulation::states::NVec3;

/// Receiver of the tabular position dump
pub trait TableSink {
    /// Scalar run parameters, written once before any row
    fn header(&mut self, params: &[(&str, f64)]) -> Result<()>;

    fn row(&mut self, x: NVec3, t: f64) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory table, mostly for tests and post-processing
#[derive(Debug, Clone, Default)]
pub struct PositionTable {
    pub params: Vec<(String, f64)>,
    pub rows: Vec<[f64; 4]>,
}

impl TableSink for PositionTable {
    fn header(&mut self, params: &[(&str, f64)]) -> Result<()> {
        self.params = params.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        Ok(())
    }

    fn row(&mut self, x: NVec3, t: f64) -> Result<()> {
        self.rows.push([x.x, x.y, x.z, t]);
        Ok(())
    }
}

/// CSV layout: `name,value` lines for the parameters, then the
/// `x,y,z,t` table
pub struct CsvTableWriter<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl CsvTableWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> CsvTableWriter<W> {
    pub fn new(inner: W) -> Self {
        let writer = csv::WriterBuilder::new().flexible(true).from_writer(inner);
        Self {
            writer,
            header_written: false,
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| Error::Io(e.into_error()))
    }
}

impl<W: Write> TableSink for CsvTableWriter<W> {
    fn header(&mut self, params: &[(&str, f64)]) -> Result<()> {
        if self.header_written {
            return Err(Error::InvalidConfig("table header written twice".into()));
        }
        for (name, value) in params {
            self.writer.write_record(&[name.to_string(), value.to_string()])?;
        }
        self.writer.write_record(["x", "y", "z", "t"])?;
        self.header_written = true;
        Ok(())
    }

    fn row(&mut self, x: NVec3, t: f64) -> Result<()> {
        if !self.header_written {
            self.header(&[])?;
        }
        self.writer
            .write_record(&[x.x.to_string(), x.y.to_string(), x.z.to_string(), t.to_string()])?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
