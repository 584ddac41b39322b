use std::fs;
use std::path::{Path, PathBuf};

use clap::{crate_description, crate_name, crate_version, App, Arg};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use plfar::extract_file;

fn main() -> anyhow::Result<()> {
    let matches = App::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .arg(
            Arg::with_name("read")
                .help("PLF firmware file, or directory of firmware files, to read")
                .short("r")
                .long("read")
                .required(true)
                .takes_value(true)
                .value_name("PATH"),
        )
        .arg(
            Arg::with_name("write")
                .help("Directory into which artifacts will be extracted (defaults to '.')")
                .short("w")
                .long("write")
                .takes_value(true)
                .value_name("DIR")
                .default_value("."),
        )
        .arg(
            Arg::with_name("log")
                .help("Log every artifact and filesystem record as it is written")
                .short("l")
                .long("log"),
        )
        .arg(
            Arg::with_name("info")
                .help("Report summary information about each extraction")
                .short("i")
                .long("info"),
        )
        .get_matches();

    let level = if matches.is_present("log") {
        "plfar=debug"
    } else if matches.is_present("info") {
        "plfar=info"
    } else {
        "plfar=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();

    let input = PathBuf::from(matches.value_of("read").unwrap());
    let out_dir = PathBuf::from(matches.value_of("write").unwrap());

    if input.is_dir() {
        // Each firmware extracts independently; a bad file never aborts
        // the rest of the batch
        for dir_entry in fs::read_dir(&input)? {
            let path = dir_entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Err(err) = extract_one(&path, &out_dir) {
                error!(file = %path.display(), %err, "Extraction failed");
            }
        }
        Ok(())
    } else {
        extract_one(&input, &out_dir).map_err(anyhow::Error::new)
    }
}

/// Extract one firmware file to `<out_dir>/<file stem>/`
fn extract_one(firmware: &Path, out_dir: &Path) -> Result<(), plfar::Error> {
    let stem = firmware.file_stem().unwrap_or_else(|| firmware.as_os_str());
    let report = extract_file(firmware, out_dir.join(stem))?;
    info!(file = %firmware.display(), "{}", report);
    Ok(())
}
