use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use cecog::classes::ClassDefinitions;
use cecog::hmm::{DiscreteHmm, HmmError};
use cecog::task::{self, TaskError, TaskEvent};

use super::config::{Config, HmmConfig};

/// One labelled track from a track file
#[derive(Debug, Clone, PartialEq)]
struct Track {
    id: String,
    labels: Vec<i32>,
}

/// Parse `track_id<TAB>l1,l2,...` lines; blank lines and `#` comments are skipped
fn read_tracks<R: BufRead>(reader: R) -> Result<Vec<Track>> {
    let mut tracks = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let (id, labels) = line
            .split_once('\t')
            .with_context(|| format!("Line {}: expected '<track id><TAB><labels>'", line_no + 1))?;
        let labels = labels
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i32>()
                    .with_context(|| format!("Line {}: invalid label '{}'", line_no + 1, s))
            })
            .collect::<Result<Vec<_>>>()?;
        tracks.push(Track {
            id: id.trim().to_string(),
            labels,
        });
    }
    Ok(tracks)
}

/// Class labels in state order: the definition order if classes are known,
/// otherwise the sorted set of labels seen in the tracks
fn state_labels(tracks: &[Track], classes: Option<&ClassDefinitions>) -> Vec<i32> {
    match classes {
        Some(classes) => classes.labels(),
        None => {
            let mut labels: Vec<i32> = tracks.iter().flat_map(|t| t.labels.iter().copied()).collect();
            labels.sort_unstable();
            labels.dedup();
            labels
        }
    }
}

fn to_indices(track: &Track, labels: &[i32]) -> Result<Vec<usize>> {
    track
        .labels
        .iter()
        .map(|label| {
            labels
                .iter()
                .position(|l| l == label)
                .with_context(|| format!("Track {}: label {} has no class definition", track.id, label))
        })
        .collect()
}

/// Viterbi-correct every track of a track file
pub fn smooth(
    tracks: PathBuf,
    output: Option<PathBuf>,
    classes: Option<PathBuf>,
    fit: bool,
    config: &Config,
) -> Result<()> {
    let classes = classes
        .map(|path| {
            ClassDefinitions::from_tsv_file(&path)
                .with_context(|| format!("Failed to read class definitions: {}", path.display()))
        })
        .transpose()?;

    let file = File::open(&tracks).with_context(|| format!("Failed to open {}", tracks.display()))?;
    let mut tracks = read_tracks(BufReader::new(file))?;
    let before = tracks.len();
    tracks.retain(|t| !t.labels.is_empty());
    if tracks.len() < before {
        warn!("Skipped {} empty tracks", before - tracks.len());
    }
    if tracks.is_empty() {
        anyhow::bail!("No labelled tracks found");
    }

    let labels = state_labels(&tracks, classes.as_ref());
    let sequences = tracks
        .iter()
        .map(|t| to_indices(t, &labels))
        .collect::<Result<Vec<_>>>()?;

    info!("{} tracks, {} classes", sequences.len(), labels.len());

    let mut model = DiscreteHmm::estimate_from_labels(
        &sequences,
        labels.len(),
        config.hmm.confidence.unwrap_or(HmmConfig::DEFAULT_CONFIDENCE),
        config.hmm.pseudo_count.unwrap_or(HmmConfig::DEFAULT_PSEUDO_COUNT),
    )
    .context("Failed to estimate the initial model")?;

    if fit {
        model = fit_in_background(model, sequences.clone(), config)?;
    }

    let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    let mut changed = 0;
    for (track, sequence) in tracks.iter().zip(&sequences) {
        let path = model.smooth(sequence)?;
        changed += path.iter().zip(sequence).filter(|(a, b)| a != b).count();
        let corrected = path
            .iter()
            .map(|&state| labels[state].to_string())
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{}\t{}", track.id, corrected)?;
    }
    out.flush()?;

    info!("Corrected {} labels", changed);
    if let Some(path) = &output {
        info!("Wrote {} tracks to {}", tracks.len(), path.display());
    }

    Ok(())
}

/// Run Baum-Welch on a worker thread and relay its log output
fn fit_in_background(model: DiscreteHmm, sequences: Vec<Vec<usize>>, config: &Config) -> Result<DiscreteHmm> {
    let options = config.fit_options();

    let handle = task::spawn("hmm-fit", move |ctx| {
        let mut model = model;
        ctx.log(
            log::Level::Info,
            format!("Fitting on {} sequences (max {} iterations)", sequences.len(), options.max_iterations),
        );
        let max_iterations = options.max_iterations;
        let report = model
            .fit_with(&sequences, &options, |r| {
                ctx.progress(
                    r.iterations,
                    max_iterations,
                    format!("log-likelihood {:.3}", r.log_likelihood),
                );
                if ctx.is_aborted() {
                    return Err(HmmError::Interrupted);
                }
                Ok(())
            })
            .map_err(|e| match e {
                HmmError::Interrupted => TaskError::Aborted,
                e => TaskError::failed(e),
            })?;
        ctx.log(
            log::Level::Info,
            format!(
                "Fit finished after {} iterations, log-likelihood {:.3}{}",
                report.iterations,
                report.log_likelihood,
                if report.converged { "" } else { " (not converged)" }
            ),
        );
        Ok(model)
    })?;

    for event in handle.events() {
        if task::relay_log("hmm-fit", &event) {
            continue;
        }
        match event {
            TaskEvent::Progress { done, total, message } => {
                debug!("[{}/{}] {}", done, total, message);
            }
            TaskEvent::Finished | TaskEvent::Failed(_) => break,
            TaskEvent::Log { .. } => {}
        }
    }

    handle.join().context("Model fitting failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cecog::classes::ClassDefinition;
    use cecog::color::Rgb;
    use std::io::Cursor;

    #[test]
    fn test_read_tracks() {
        let data = "# id\tlabels\n7\t1,1,2, 2\n\n8\t3\n9\t\n";
        let tracks = read_tracks(Cursor::new(data)).unwrap();
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0], Track { id: "7".into(), labels: vec![1, 1, 2, 2] });
        assert!(tracks[2].labels.is_empty());

        assert!(read_tracks(Cursor::new("7 1,2\n")).is_err());
        assert!(read_tracks(Cursor::new("7\t1,x\n")).is_err());
    }

    #[test]
    fn test_state_labels() {
        let tracks = vec![
            Track { id: "a".into(), labels: vec![5, 2] },
            Track { id: "b".into(), labels: vec![2, 9] },
        ];
        assert_eq!(state_labels(&tracks, None), vec![2, 5, 9]);

        let classes: ClassDefinitions = [
            ClassDefinition::new(9, "apoptosis", Rgb::BLACK),
            ClassDefinition::new(2, "interphase", Rgb::WHITE),
        ]
        .into_iter()
        .collect();
        let labels = state_labels(&tracks, Some(&classes));
        assert_eq!(labels, vec![9, 2]);
        assert_eq!(to_indices(&tracks[1], &labels).unwrap(), vec![1, 0]);
        assert!(to_indices(&tracks[0], &labels).is_err());
    }
}
