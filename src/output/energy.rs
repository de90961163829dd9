//! Energy time-series sinks
//!
//! The engine pushes one `EnergySample` per step. Plotting lives outside
//! the crate; these sinks either keep the series in memory or stream it as
//! CSV (`t,kinetic,potential,total`).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::simulation::energy::EnergySample;

/// Receiver of per-step energy samples
pub trait EnergySink {
    fn record(&mut self, sample: &EnergySample) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Discards every sample
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EnergySink for NullSink {
    fn record(&mut self, _sample: &EnergySample) -> Result<()> {
        Ok(())
    }
}

/// In-memory series, optionally keeping only every `stride`-th sample
#[derive(Debug, Clone)]
pub struct EnergySeries {
    samples: Vec<EnergySample>,
    stride: usize,
    seen: usize,
}

impl Default for EnergySeries {
    fn default() -> Self {
        Self::with_stride(1)
    }
}

impl EnergySeries {
    pub fn with_stride(stride: usize) -> Self {
        Self {
            samples: Vec::new(),
            stride: stride.max(1),
            seen: 0,
        }
    }

    pub fn samples(&self) -> &[EnergySample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&EnergySample> {
        self.samples.last()
    }

    /// Largest |total - first total| over the series
    pub fn max_total_drift(&self) -> f64 {
        let Some(first) = self.samples.first() else {
            return 0.0;
        };
        self.samples
            .iter()
            .map(|s| (s.total - first.total).abs())
            .fold(0.0, f64::max)
    }
}

impl EnergySink for EnergySeries {
    fn record(&mut self, sample: &EnergySample) -> Result<()> {
        if self.seen % self.stride == 0 {
            self.samples.push(*sample);
        }
        self.seen += 1;
        Ok(())
    }
}

/// Streams samples as CSV rows
pub struct CsvEnergyWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvEnergyWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(File::create(path)?)
    }
}

impl<W: Write> CsvEnergyWriter<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(["t", "kinetic", "potential", "total"])?;
        Ok(Self { writer })
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}

impl<W: Write> EnergySink for CsvEnergyWriter<W> {
    fn record(&mut self, sample: &EnergySample) -> Result<()> {
        self.writer.write_record(&[
            sample.t.to_string(),
            sample.kinetic.to_string(),
            sample.potential.to_string(),
            sample.total.to_string(),
        ])?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
