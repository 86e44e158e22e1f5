//! CSV export for sampled device telemetry.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::devices::Telemetry;

/// Column header for CSV telemetry export.
const HEADER: &str = "device_id,device_type,status,voltage,current,power,timestamp";

/// Exports telemetry samples to a CSV file at the given path.
///
/// Writes a header row followed by one data row per sample, in the order
/// given. Identical input produces identical output.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(samples: &[Telemetry], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(samples, buf)
}

/// Writes telemetry samples as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(samples: &[Telemetry], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for t in samples {
        wtr.write_record(&[
            t.device_id.clone(),
            t.device_type.as_str().to_string(),
            t.status.as_str().to_string(),
            format!("{:.4}", t.voltage),
            format!("{:.4}", t.current),
            format!("{:.4}", t.power),
            format!("{:.3}", t.timestamp),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
