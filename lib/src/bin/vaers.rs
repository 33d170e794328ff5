use clap::Parser;
use qu::ick_use::*;
use std::path::PathBuf;
use vaers_analysis::{
    header,
    stats::{self, ProfileOptions},
    Config, Dataset, LogDiagnostics, RangeSet, ReportField, ResultExt,
};

#[derive(Parser)]
struct Opt {
    /// Print the number of reports for each value of `--field`
    #[clap(short, long)]
    count: bool,
    /// The field to count with `--count`
    #[clap(long, default_value = "VAX_NAME")]
    field: ReportField,
    /// Only count values containing this (ignoring case). Defaults to "COVID" when counting
    /// VAX_NAME
    #[clap(long)]
    filter: Option<String>,
    /// Print the number of reports received on each day
    #[clap(short, long)]
    dates: bool,
    /// Print the symptoms reported for each vaccine
    #[clap(short, long)]
    symptoms: bool,
    /// Print the symptoms that contain TEXT
    #[clap(short, long)]
    text: Option<String>,
    /// Print the vaccines given in reports with a symptom containing TEXT
    #[clap(short, long)]
    find: Option<String>,
    /// Print the number of reports in each age band
    #[clap(short, long)]
    ages: bool,
    /// Only include reports for vaccines containing this (ignoring case), for `--symptoms` and
    /// `--text`
    #[clap(long)]
    vaccine: Option<String>,
    /// Year of the data files to use
    #[clap(short, long)]
    year: Option<i32>,
    /// Directory containing the data files
    #[clap(long)]
    data_dir: Option<PathBuf>,
    /// Read the `.json` files written by `convert` instead of the csv files
    #[clap(long)]
    json: bool,
    /// Settings file
    ///
    /// Without this, symptoms are profiled with a minimum count of 25, no minimum percentage,
    /// and COVID-19 symptoms merged.
    #[clap(long)]
    config: Option<PathBuf>,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let mut config = match &opt.config {
        Some(path) => Config::load(path).print_error()?,
        None => Config {
            profile: ProfileOptions::covid19(),
            ..Config::default()
        },
    };
    if let Some(year) = opt.year {
        config.year = year;
    }
    if let Some(data_dir) = &opt.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(vaccine) = &opt.vaccine {
        config.profile.vaccine_filter = Some(vaccine.clone());
    }

    let mut diagnostics = LogDiagnostics::default();
    let data = if opt.json {
        Dataset::load_json(&config, &mut diagnostics)
    } else {
        Dataset::load(&config, &mut diagnostics)
    }
    .print_error()?;
    if diagnostics.count() > 0 {
        event!(
            Level::WARN,
            "{} report IDs were missing from the case data",
            diagnostics.count()
        );
    }
    let reports = &data.reports;

    if opt.count {
        header(&format!("Reports by {}", opt.field));
        let filter = opt
            .filter
            .as_deref()
            .or_else(|| stats::default_count_filter(opt.field));
        match stats::count_by(reports, opt.field, filter) {
            Ok(ranking) => {
                println!("{}", ranking.term_table());
                println!("Total: {}", ranking.total);
            }
            Err(e) => println!("{}", e),
        }
    }

    if opt.dates {
        header("Reports received by date");
        let series = stats::reports_by_date(reports);
        println!("{}", series.term_table());
        println!("Total: {}", series.total());
    }

    if opt.symptoms {
        let profile = stats::vaccine_symptom_profile(reports, &config.profile);
        for vaccine in profile.vaccines.iter() {
            let name = if vaccine.vaccine.is_empty() {
                "(no vaccine data)"
            } else {
                &*vaccine.vaccine
            };
            header(&format!("{} ({} reports)", name, vaccine.events));
            println!("{}", vaccine.term_table(&profile.options));
        }
    }

    if let Some(text) = &opt.text {
        header(&format!("Symptoms containing \"{}\"", text));
        let search =
            stats::symptom_text_search(reports, text, config.profile.vaccine_filter.as_deref());
        println!("{}", search.term_table());
        println!("Total: {}", search.total);
    }

    if let Some(text) = &opt.find {
        header(&format!("Vaccines in reports with symptoms containing \"{}\"", text));
        let ids = stats::find_ids_by_substring(reports, &[ReportField::Symptoms], text);
        let matching = reports.select(&ids);
        match stats::count_by(matching, ReportField::VaxName, None) {
            Ok(ranking) => {
                println!("{}", ranking.term_table());
                println!("Total: {}", ranking.total);
            }
            Err(e) => println!("{}", e),
        }
    }

    if opt.ages {
        header("Reports by age");
        let bands = stats::age_bands(reports, &RangeSet::age_bands());
        println!("{}", bands.term_table());
    }
    Ok(())
}
