use anyhow::{Context, Result};

use cecog::time::{TimeConverter, TimeUnit};

/// Convert a time value and print the result
///
/// Without a time-lapse interval only seconds, minutes and hours can be
/// converted into each other.
pub fn run(value: f64, from: &str, to: Option<&str>, converter: Option<TimeConverter>) -> Result<()> {
    let from = from.parse::<TimeUnit>().context("Invalid --from unit")?;
    let to = to
        .map(|unit| unit.parse::<TimeUnit>().context("Invalid --to unit"))
        .transpose()?;

    let needs_frames = from == TimeUnit::Frames || to == Some(TimeUnit::Frames);
    let has_timelapse = converter.is_some();
    let converter = match converter {
        Some(converter) => converter,
        None if needs_frames => {
            anyhow::bail!("Converting frames needs a time-lapse interval (--timelapse or [timing] in the config)")
        }
        // Frame interval is irrelevant between wall-clock units
        None => TimeConverter::new(1.0)?,
    };

    match to {
        Some(to) => println!("{}", converter.convert(value, from, to)),
        None => {
            for unit in TimeUnit::ALL {
                if unit == TimeUnit::Frames && !has_timelapse {
                    continue;
                }
                println!(
                    "{:>14.4} {}",
                    converter.convert(value, from, unit),
                    unit.abbreviation()
                );
            }
        }
    }

    Ok(())
}
