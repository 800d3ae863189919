use anyhow::Context;
use echocore::math::StatsHelper;
use echocore::processing::TableRow;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes the table as CSV; missing frequency or value becomes an empty field.
/// In dB, a mean that is not positive has no logarithm and is written empty too.
pub fn write_table<W: Write>(sink: W, rows: &[TableRow], db_output: bool) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    for row in rows {
        let mean_value = match row.mean_value {
            Some(v) if db_output && v > 0.0 => Some(StatsHelper::to_db(v)),
            Some(_) if db_output => None,
            other => other,
        };
        let row = TableRow {
            mean_value,
            ..row.clone()
        };
        writer.serialize(&row).context("serializing table row")?;
    }
    // Header for an empty table as well.
    if rows.is_empty() {
        writer
            .write_record(["interval", "layer", "frequency", "mean_value"])
            .context("writing table header")?;
    }
    writer.flush().context("flushing table")?;
    Ok(())
}

pub fn write_table_file(path: &Path, rows: &[TableRow], db_output: bool) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_table(file, rows, db_output).with_context(|| format!("writing {}", path.display()))
}
