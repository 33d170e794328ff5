//! Convert the VAERS csv extracts to JSON objects keyed on `VAERS_ID`.
use clap::Parser;
use qu::ick_use::*;
use std::{fs, io, path::PathBuf};
use vaers_analysis::{json_path, load_rows_from_path, rows_to_keyed_json, Config, Source};

#[derive(Parser)]
struct Opt {
    /// Files to convert. Defaults to the three files for `--year` in `--data-dir`.
    files: Vec<PathBuf>,
    /// Year of the data files to use
    #[clap(short, long)]
    year: Option<i32>,
    /// Directory containing the data files
    #[clap(long)]
    data_dir: Option<PathBuf>,
    /// If set, allow overwriting an existing file at the output location
    #[clap(long)]
    overwrite: bool,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let files = if opt.files.is_empty() {
        let mut config = Config::default();
        if let Some(year) = opt.year {
            config.year = year;
        }
        if let Some(data_dir) = opt.data_dir {
            config.data_dir = data_dir;
        }
        [Source::Case, Source::Symptom, Source::Vaccine]
            .into_iter()
            .map(|source| config.source_path(source))
            .collect()
    } else {
        opt.files
    };

    for input in files {
        let output = json_path(&input);
        if output.exists() && !opt.overwrite {
            bail!(
                "\"{}\" already exists (use --overwrite to replace it)",
                output.display()
            );
        }
        let rows = load_rows_from_path(&input)?;
        let count = rows.len();
        let json = rows_to_keyed_json(rows)
            .with_context(|| format!("while converting \"{}\"", input.display()))?;
        let out = io::BufWriter::new(fs::File::create(&output)?);
        serde_json::to_writer_pretty(out, &json)
            .with_context(|| format!("unable to save data to \"{}\"", output.display()))?;
        event!(
            Level::INFO,
            "wrote {} rows from \"{}\" to \"{}\"",
            count,
            input.display(),
            output.display()
        );
    }
    Ok(())
}
