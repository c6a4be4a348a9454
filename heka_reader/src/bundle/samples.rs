//! Raw sample access for traces.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::error::{BundleError, Result};
use super::record::Record;
use super::reader::Bundle;
use super::schema::Endian;

/// Numeric encodings of a trace's sample block, keyed by the trace's
/// `DataFormat` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Int16,
    Int32,
    Real16,
    Real32,
}

impl SampleFormat {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SampleFormat::Int16),
            1 => Some(SampleFormat::Int32),
            2 => Some(SampleFormat::Real16),
            3 => Some(SampleFormat::Real32),
            _ => None,
        }
    }

    pub fn width(self) -> usize {
        match self {
            SampleFormat::Int16 | SampleFormat::Real16 => 2,
            SampleFormat::Int32 | SampleFormat::Real32 => 4,
        }
    }

    fn decode<B: ByteOrder>(self, raw: &[u8]) -> Vec<f64> {
        raw.chunks_exact(self.width())
            .map(|chunk| match self {
                SampleFormat::Int16 => f64::from(B::read_i16(chunk)),
                SampleFormat::Int32 => f64::from(B::read_i32(chunk)),
                SampleFormat::Real16 => f64::from(f16_to_f32(B::read_u16(chunk))),
                SampleFormat::Real32 => f64::from(B::read_f32(chunk)),
            })
            .collect()
    }
}

/// Location and calibration of one trace's samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceLayout {
    pub offset: u64,
    pub points: usize,
    pub format: SampleFormat,
    pub scale: f64,
    pub zero: f64,
}

impl TraceLayout {
    pub fn from_trace(trace: &Record) -> Result<Self> {
        let data = trace.i64("Data")?;
        let points = trace.i64("DataPoints")?;
        let offset = u64::try_from(data)
            .map_err(|_| BundleError::invalid_trace(format!("negative data offset {data}")))?;
        let points = usize::try_from(points)
            .map_err(|_| BundleError::invalid_trace(format!("negative point count {points}")))?;

        let code = trace.byte("DataFormat")?;
        let format = SampleFormat::from_code(code)
            .ok_or(BundleError::UnsupportedDataFormat { code, offset: data })?;

        Ok(TraceLayout {
            offset,
            points,
            format,
            scale: trace.f64("DataScaler")?,
            zero: trace.f64("ZeroData")?,
        })
    }

    pub fn byte_len(&self) -> usize {
        self.points * self.format.width()
    }

    /// Decode a raw block into calibrated values.
    pub fn calibrate(&self, raw: &[u8], endian: Endian) -> Vec<f64> {
        let values = match endian {
            Endian::Little => self.format.decode::<LittleEndian>(raw),
            Endian::Big => self.format.decode::<BigEndian>(raw),
        };
        values
            .into_iter()
            .map(|v| v * self.scale + self.zero)
            .collect()
    }
}

/// Reads trace samples out of a bundle's raw data stream.
#[derive(Debug, Clone, Copy)]
pub struct SampleReader<'a> {
    bundle: &'a Bundle,
}

impl<'a> SampleReader<'a> {
    pub(crate) fn new(bundle: &'a Bundle) -> Self {
        SampleReader { bundle }
    }

    /// Read and calibrate the samples of one trace record.
    pub fn read(&self, trace: &Record) -> Result<Vec<f64>> {
        let layout = TraceLayout::from_trace(trace)?;
        self.read_layout(&layout)
    }

    pub fn read_layout(&self, layout: &TraceLayout) -> Result<Vec<f64>> {
        if layout.points == 0 {
            return Ok(Vec::new());
        }
        let raw = self.bundle.read_at(layout.offset, layout.byte_len())?;
        Ok(layout.calibrate(&raw, self.bundle.endian()))
    }
}

/// Widen an IEEE 754 binary16 value.
pub fn f16_to_f32(bits: u16) -> f32 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = i32::from((bits >> 10) & 0x1f);
    let mantissa = f32::from(bits & 0x03ff);

    match exponent {
        0 => sign * mantissa * 2f32.powi(-24),
        0x1f if mantissa == 0.0 => sign * f32::INFINITY,
        0x1f => f32::NAN,
        _ => sign * (1.0 + mantissa / 1024.0) * 2f32.powi(exponent - 15),
    }
}
