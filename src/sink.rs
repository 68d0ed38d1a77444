//! Report sinks: where a finished [`Report`] goes.
//!
//! A sink only receives an already-final report. It never sees the
//! classification and cannot change the partition.
//!
//! - [`WriterSink`] writes a rendering to any `io::Write` (stdout in the CLI).
//! - [`FileSink`] writes a rendering to a file.
//! - [`DeleteListSink`] writes one plain name list per section, the format the
//!   deletion step consumes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};
use crate::reconcile::Disposition;
use crate::report::{RenderOptions, Report};

/// Receives the report of a run.
pub trait ReportSink {
    fn deliver(&mut self, report: &Report) -> Result<()>;
}

/// Which rendering a sink produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn render(&self, report: &Report, options: &RenderOptions) -> Result<String> {
        match self {
            ReportFormat::Text => Ok(report.render_text(options)),
            ReportFormat::Json => report.to_json().map(|mut json| {
                json.push('\n');
                json
            }),
        }
    }
}

/// Writes the rendering to an `io::Write`.
pub struct WriterSink<W: Write> {
    writer: W,
    format: ReportFormat,
    options: RenderOptions,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: ReportFormat, options: RenderOptions) -> Self {
        Self {
            writer,
            format,
            options,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn deliver(&mut self, report: &Report) -> Result<()> {
        let rendered = self.format.render(report, &self.options)?;
        self.writer
            .write_all(rendered.as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(|e| Error::Report {
                message: format!("cannot write report: {}", e),
            })
    }
}

/// Writes the rendering to a file, replacing it.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    format: ReportFormat,
    options: RenderOptions,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>, format: ReportFormat, options: RenderOptions) -> Self {
        Self {
            path: path.into(),
            format,
            options,
        }
    }
}

impl ReportSink for FileSink {
    fn deliver(&mut self, report: &Report) -> Result<()> {
        let rendered = self.format.render(report, &self.options)?;
        write_file(&self.path, &rendered)?;
        info!("Wrote report to {}", self.path.display());
        Ok(())
    }
}

/// Writes `keep.txt` and one `delete_<tier>.txt` per delete tier.
///
/// Each file starts with a `#` comment header and then lists one name per
/// line, sorted. Empty tiers still get a file so stale lists from an earlier
/// run are always overwritten.
#[derive(Debug, Clone)]
pub struct DeleteListSink {
    dir: PathBuf,
}

impl DeleteListSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_name(disposition: Disposition) -> String {
        match disposition {
            Disposition::Keep => "keep.txt".to_string(),
            Disposition::Delete(tier) => format!("delete_{}.txt", tier.as_str().replace('-', "_")),
        }
    }
}

impl ReportSink for DeleteListSink {
    fn deliver(&mut self, report: &Report) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::Report {
            message: format!("cannot create {}: {}", self.dir.display(), e),
        })?;

        for section in &report.sections {
            let header = match section.disposition {
                Disposition::Keep => format!("# Recommended to keep ({} repositories)", section.count),
                Disposition::Delete(tier) => {
                    format!("# Recommended for deletion: {} ({} repositories)", tier, section.count)
                }
            };
            let mut content = header;
            content.push('\n');
            for name in &section.repositories {
                content.push_str(name);
                content.push('\n');
            }
            write_file(&self.dir.join(Self::file_name(section.disposition)), &content)?;
        }

        info!("Wrote delete lists to {}", self.dir.display());
        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| Error::Report {
        message: format!("cannot write {}: {}", path.display(), e),
    })
}
