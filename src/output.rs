//! This module is in charge of outputting the final analysis results to the
//! standard output and various files

use crate::{
    aggregator::PolarisationHistograms, histogram::SparseHistogram, numeric::Float,
    preselection::SelectionSummary, Result,
};

use eyre::WrapErr;
use time::{macros::format_description, OffsetDateTime};
use tracing::info;

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    time::Duration,
};

/// File in which histograms are written
const DATA_FILE: &str = "polarisation.data";

/// File in which execution timings are written
const TIMES_FILE: &str = "polarisation.times";

/// Output the analysis results to the console and to disk
pub fn dump_results(
    selection: &SelectionSummary,
    histograms: &PolarisationHistograms,
    elapsed_time: Duration,
) -> Result<()> {
    // Print out a summary on stdout
    print_summary(histograms);

    // Compute a timestamp of when the run ended
    let timestamp = OffsetDateTime::now_utc()
        .format(format_description!(
            "[day]-[month repr:short]-[year repr:last_two]   [hour]:[minute]:[second]"
        ))
        .wrap_err("Failed to format the end-of-run timestamp")?;

    // Write execution timings to a file
    {
        let mut tim_file = File::create(TIMES_FILE)
            .wrap_err_with(|| format!("Could not create {TIMES_FILE}"))?;
        write_timings(&mut tim_file, &timestamp, selection, elapsed_time)?;
    }

    // Write main results file
    {
        let dat_file = File::create(DATA_FILE)
            .wrap_err_with(|| format!("Could not create {DATA_FILE}"))?;
        let mut dat_file = BufWriter::new(dat_file);
        write_histograms(&mut dat_file, selection, histograms)?;
        dat_file.flush()?;
    }
    info!("Results written to {DATA_FILE} and {TIMES_FILE}");

    // ...and we're done
    Ok(())
}

/// Print the number of entries of each histogram
fn print_summary(histograms: &PolarisationHistograms) {
    println!("Processing mode: {}", histograms.mode());
    println!("Observable tuples: {}", histograms.num_tuples());
    for hist in histograms.iter() {
        println!(
            "{:<24} {:>10} entries in {:>8} bins",
            hist.name(),
            hist.entries(),
            hist.iter().count()
        );
    }
}

/// Write down end-of-run timestamp and performance stats
fn write_timings(
    writer: &mut impl Write,
    timestamp: &str,
    selection: &SelectionSummary,
    elapsed_time: Duration,
) -> io::Result<()> {
    let elapsed_secs = elapsed_time.as_secs_f64() as Float;
    writeln!(writer, " {timestamp}")?;
    writeln!(writer, " ---------------------------------------------")?;
    write_key_value(writer, "Elapsed time (s)", elapsed_secs)?;
    let secs_per_candidate = elapsed_secs / selection.num_selected.max(1) as Float;
    write_key_value(writer, "Elapsed time per candidate (s)", secs_per_candidate)
}

/// Write down the run statistics and the contents of every histogram
fn write_histograms(
    writer: &mut impl Write,
    selection: &SelectionSummary,
    histograms: &PolarisationHistograms,
) -> io::Result<()> {
    write_key_value(writer, "Processing mode", histograms.mode())?;
    write_key_value(writer, "Candidates read", selection.num_read)?;
    write_key_value(writer, "... selected", selection.num_selected)?;
    write_key_value(writer, "... rejected", selection.num_rejected)?;
    write_key_value(writer, "... of another channel", selection.num_other_channel)?;
    write_key_value(writer, "Observable tuples", histograms.num_tuples())?;
    for hist in histograms.iter() {
        writeln!(writer, " ---------------------------------------------")?;
        write_histogram(writer, hist)?;
    }
    Ok(())
}

/// Write down a single histogram
///
/// Axes are listed with their binning, then non-empty bins follow as one
/// line of bin indices per bin, ending with the bin count. Bin 0 of an axis
/// is its underflow bin, and bin `bins + 1` its overflow bin.
///
fn write_histogram(writer: &mut impl Write, hist: &SparseHistogram) -> io::Result<()> {
    write_key_value(writer, "Histogram", hist.name())?;
    write_key_value(writer, "Title", hist.title())?;
    for (idx, axis) in hist.axes().iter().enumerate() {
        let binning = &axis.binning;
        writeln!(
            writer,
            " Axis {idx:<26}: {} | {} {} {}",
            axis.title, binning.bins, binning.min, binning.max
        )?;
    }
    write_key_value(writer, "Entries", hist.entries())?;
    for (bin, count) in hist.iter() {
        for idx in bin {
            write!(writer, "{idx:>5}")?;
        }
        writeln!(writer, "{count:>12}")?;
    }
    Ok(())
}

/// Key-value output that uses fixed-size columns for better readability
fn write_key_value(writer: &mut impl Write, key: &str, value: impl std::fmt::Display) -> io::Result<()> {
    writeln!(writer, " {key:<31}: {value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        angles::{AngularObservables, DecayKinematics, ObservableTuple},
        config::Configuration,
        momentum::ThreeMomentum,
        numeric::masses,
    };

    fn filled_histograms() -> PolarisationHistograms {
        let mut hists = PolarisationHistograms::new(&Configuration::default()).unwrap();
        let kin = DecayKinematics {
            daughter: ThreeMomentum::new(1., 0., 0.),
            daughter_mass: 0.14,
            parent: ThreeMomentum::new(2., 0., 0.),
            parent_mass: 2.01,
            nominal_mass: masses::D_STAR,
        };
        let tuple = ObservableTuple {
            inv_mass: 0.1455,
            angular: AngularObservables::compute(&kin, &ThreeMomentum::new(0., 0., 1.)),
            is_rotated: false,
            ml_scores: None,
        };
        hists.fill(&tuple);
        hists.fill(&tuple);
        hists
    }

    #[test]
    fn histogram_file_layout() {
        let selection = SelectionSummary {
            num_read: 3,
            num_selected: 2,
            num_rejected: 1,
            num_other_channel: 0,
        };
        let mut output = Vec::new();
        write_histograms(&mut output, &selection, &filled_histograms()).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains(" Candidates read                : 3\n"));
        assert!(output.contains(" Observable tuples              : 2\n"));
        for name in ["helicity", "production", "beam", "random"] {
            assert!(output.contains(&format!(": polarisation_{name}\n")));
        }
        assert!(output.contains(": inv. mass (GeV/c^2) | 200 0.139 0.179\n"));

        // One line per histogram for the single filled bin, with 5 indices
        let bin_lines = output
            .lines()
            .filter(|line| line.trim_end().ends_with(" 2") && !line.contains(':'))
            .collect::<Vec<_>>();
        assert_eq!(bin_lines.len(), 4);
        assert!(bin_lines
            .iter()
            .all(|line| line.split_whitespace().count() == 6));
    }

    #[test]
    fn timings_file_layout() {
        let selection = SelectionSummary {
            num_read: 10,
            num_selected: 4,
            ..SelectionSummary::default()
        };
        let mut output = Vec::new();
        write_timings(&mut output, "01-Jan-26   00:00:00", &selection, Duration::from_secs(2))
            .unwrap();
        let output = String::from_utf8(output).unwrap();
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], " 01-Jan-26   00:00:00");
        assert_eq!(lines[2], " Elapsed time (s)               : 2");
        assert_eq!(lines[3], " Elapsed time per candidate (s) : 0.5");
    }
}
