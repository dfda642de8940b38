use log::*;
use polisher::{PipelineReport, PolishError, Result};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Dump the summary of the run as JSON.
pub fn write_report(report: &PipelineReport, path: &Path) -> Result<()> {
    debug!("REPORT\t{:?}", path);
    let error = |why: std::io::Error| PolishError::resource(format!("report {:?}", path), why);
    let mut wtr = std::fs::File::create(path).map(BufWriter::new).map_err(error)?;
    serde_json::ser::to_writer_pretty(&mut wtr, report).map_err(|why| error(why.into()))?;
    writeln!(wtr).map_err(error)?;
    wtr.flush().map_err(error)
}
