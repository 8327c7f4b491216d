//! Mechanism for loading and sharing the analysis configuration

use crate::{
    angles::ReferenceAxis,
    candidate::DecayChannel,
    histogram::Binning,
    numeric::Float,
    random::RandomAxisSampling,
    Result,
};

use eyre::{ensure, eyre, WrapErr};
use tracing::info;

use std::{fmt, fs, str::FromStr};

/// Combination of decay channel and classifier usage which is analysed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessingMode {
    /// D* candidates, rectangular selection
    Dstar,

    /// D* candidates, with classifier scores
    DstarWithMl,

    /// Λc → pKπ candidates, rectangular selection
    LcToPKPi,

    /// Λc → pKπ candidates, with classifier scores
    LcToPKPiWithMl,
}
//
impl ProcessingMode {
    /// Decay channel analysed in this mode
    pub fn channel(self) -> DecayChannel {
        match self {
            Self::Dstar | Self::DstarWithMl => DecayChannel::DstarToD0Pi,
            Self::LcToPKPi | Self::LcToPKPiWithMl => DecayChannel::LcToPKPi,
        }
    }

    /// Truth that classifier scores are histogrammed in this mode
    pub fn with_ml(self) -> bool {
        matches!(self, Self::DstarWithMl | Self::LcToPKPiWithMl)
    }
}
//
impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ml = if self.with_ml() { "with" } else { "without" };
        write!(f, "{} candidates {ml} ML", self.channel())
    }
}

/// Switches selecting the processing mode, of which exactly one must be on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessSwitches {
    pub dstar: bool,
    pub dstar_with_ml: bool,
    pub lc_to_pkpi: bool,
    pub lc_to_pkpi_with_ml: bool,
}
//
impl ProcessSwitches {
    /// Determine the processing mode, or fail if it is ambiguous
    pub fn mode(&self) -> Result<ProcessingMode> {
        let switches = [
            (self.dstar, ProcessingMode::Dstar),
            (self.dstar_with_ml, ProcessingMode::DstarWithMl),
            (self.lc_to_pkpi, ProcessingMode::LcToPKPi),
            (self.lc_to_pkpi_with_ml, ProcessingMode::LcToPKPiWithMl),
        ];
        let mut enabled = switches.iter().filter(|(on, _)| *on).map(|&(_, mode)| mode);
        let mode = enabled.next().ok_or_else(|| eyre!("No processing mode enabled"))?;
        ensure!(
            enabled.next().is_none(),
            "Only one processing mode should be enabled at a time, please check your configuration"
        );
        Ok(mode)
    }
}

/// Switches enabling the histogram of each reference axis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistogramSwitches {
    pub helicity: bool,
    pub production: bool,
    pub beam: bool,
    pub random: bool,
}
//
impl HistogramSwitches {
    /// Truth that the histogram of some reference axis is enabled
    pub fn is_enabled(&self, axis: ReferenceAxis) -> bool {
        match axis {
            ReferenceAxis::Helicity => self.helicity,
            ReferenceAxis::Production => self.production,
            ReferenceAxis::Beam => self.beam,
            ReferenceAxis::Random => self.random,
        }
    }

    /// Reference axes whose histogram is enabled
    pub fn enabled(&self) -> impl Iterator<Item = ReferenceAxis> + '_ {
        ReferenceAxis::ALL
            .into_iter()
            .filter(move |&axis| self.is_enabled(axis))
    }
}

/// Binning of every histogram axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxesConfig {
    pub inv_mass: Binning,
    pub pt: Binning,
    pub pz: Binning,
    pub rapidity: Binning,
    pub cos_theta_star_helicity: Binning,
    pub cos_theta_star_production: Binning,
    pub cos_theta_star_beam: Binning,
    pub cos_theta_star_random: Binning,
    pub ml_bkg: Binning,
    pub ml_non_prompt: Binning,
    pub is_rotated: Binning,
}
//
impl AxesConfig {
    /// Binning of the decay angle cosine w.r.t. some reference axis
    pub fn cos_theta_star(&self, axis: ReferenceAxis) -> Binning {
        match axis {
            ReferenceAxis::Helicity => self.cos_theta_star_helicity,
            ReferenceAxis::Production => self.cos_theta_star_production,
            ReferenceAxis::Beam => self.cos_theta_star_beam,
            ReferenceAxis::Random => self.cos_theta_star_random,
        }
    }

    /// All binnings, tagged with the name of their configuration item
    fn named(&self) -> [(&'static str, Binning); 11] {
        [
            ("inv_mass", self.inv_mass),
            ("pt", self.pt),
            ("pz", self.pz),
            ("y", self.rapidity),
            ("cos_helicity", self.cos_theta_star_helicity),
            ("cos_production", self.cos_theta_star_production),
            ("cos_beam", self.cos_theta_star_beam),
            ("cos_random", self.cos_theta_star_random),
            ("ml_bkg", self.ml_bkg),
            ("ml_non_prompt", self.ml_non_prompt),
            ("is_rotated", self.is_rotated),
        ]
    }
}

/// Analysis configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// File from which candidates are read
    pub candidates_file: String,

    /// Processing mode selection
    pub processes: ProcessSwitches,

    /// Value of the D* selection flag that candidates must have
    pub selection_flag_dstar: bool,

    /// Minimal selection level of a Λc → pKπ mass hypothesis
    pub selection_flag_lc: i32,

    /// Number of rotated background copies per candidate
    pub num_bkg_rotations: usize,

    /// Enabled histograms
    pub histograms: HistogramSwitches,

    /// Sampling method for the random reference axis
    pub random_sampling: RandomAxisSampling,

    /// Seed of the random number generator
    pub rng_seed: u64,

    /// Histogram axis binning
    pub axes: AxesConfig,
}
//
impl Default for Configuration {
    fn default() -> Self {
        Self {
            candidates_file: "candidates.txt".to_owned(),
            processes: ProcessSwitches {
                dstar: true,
                dstar_with_ml: false,
                lc_to_pkpi: false,
                lc_to_pkpi_with_ml: false,
            },
            selection_flag_dstar: true,
            selection_flag_lc: 1,
            num_bkg_rotations: 0,
            histograms: HistogramSwitches {
                helicity: true,
                production: true,
                beam: true,
                random: true,
            },
            random_sampling: RandomAxisSampling::default(),
            rng_seed: 12345,
            axes: AxesConfig {
                inv_mass: Binning::new(200, 0.139, 0.179),
                pt: Binning::new(100, 0., 100.),
                pz: Binning::new(100, -50., 50.),
                rapidity: Binning::new(20, -1., 1.),
                cos_theta_star_helicity: Binning::new(20, -1., 1.),
                cos_theta_star_production: Binning::new(20, -1., 1.),
                cos_theta_star_beam: Binning::new(20, -1., 1.),
                cos_theta_star_random: Binning::new(20, -1., 1.),
                ml_bkg: Binning::new(100, 0., 1.),
                ml_non_prompt: Binning::new(100, 0., 1.),
                is_rotated: Binning::new(2, -0.5, 1.5),
            },
        }
    }
}
//
impl Configuration {
    /// Load the configuration from a file, check it, and print it out
    pub fn load(file_name: &str) -> Result<Self> {
        // Read out the analysis' configuration file or die trying.
        let config_str = fs::read_to_string(file_name)
            .wrap_err_with(|| format!("Could not read configuration file {file_name}"))?;
        let config = config_str.parse::<Self>()?;

        // Display it, then refuse to go any further if it makes no sense
        config.print();
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration, and determine the processing mode
    ///
    /// Every failure is fatal: the analysis must not start on an ambiguous
    /// or useless configuration.
    ///
    pub fn validate(&self) -> Result<ProcessingMode> {
        let mode = self.processes.mode()?;
        ensure!(
            self.histograms.enabled().next().is_some(),
            "No output histogram enabled"
        );
        for (name, binning) in self.axes.named() {
            binning
                .validate()
                .wrap_err_with(|| format!("Invalid binning of axis {name}"))?;
        }
        Ok(mode)
    }

    /// Display the configuration
    pub fn print(&self) {
        info!("candidates_file            : {}", self.candidates_file);
        info!("process_dstar              : {}", self.processes.dstar);
        info!("process_dstar_with_ml      : {}", self.processes.dstar_with_ml);
        info!("process_lc_to_pkpi         : {}", self.processes.lc_to_pkpi);
        info!("process_lc_to_pkpi_with_ml : {}", self.processes.lc_to_pkpi_with_ml);
        info!("selection_flag_dstar       : {}", self.selection_flag_dstar);
        info!("selection_flag_lc          : {}", self.selection_flag_lc);
        info!("n_bkg_rotations            : {}", self.num_bkg_rotations);
        for axis in ReferenceAxis::ALL {
            info!(
                "activate_{:<18}: {}",
                axis.name(),
                self.histograms.is_enabled(axis)
            );
        }
        info!("random_axis_sampling       : {}", self.random_sampling);
        info!("rng_seed                   : {}", self.rng_seed);
        for (name, binning) in self.axes.named() {
            info!("axis {:<22}: {}", name, binning);
        }
    }
}
//
impl FromStr for Configuration {
    type Err = eyre::Report;

    /// Decode the configuration items of a configuration file
    fn from_str(config_str: &str) -> Result<Self> {
        // We will iterate over the configuration items. These should be the
        // first non-whitespace chunk(s) of text on each line, the remainder
        // of the line being free-form commentary. Blank lines are ignored.
        let mut config_iter = config_str.lines().filter(|line| !line.trim().is_empty());

        // This closure fetches the next configuration item, tagging it with
        // the name of the configuration field which it is supposed to fill to
        // ease error reporting, and handling unexpected end-of-file too.
        let mut next_item = |name: &'static str| -> Result<ConfigItem> {
            config_iter
                .next()
                .map(|line| ConfigItem::new(name, line))
                .ok_or_else(|| eyre!("Missing configuration of {}", name))
        };

        // Decode the configuration items into concrete values
        Ok(Configuration {
            candidates_file: next_item("candidates_file")?.first()?.to_owned(),
            processes: ProcessSwitches {
                dstar: next_item("process_dstar")?.parse_bool()?,
                dstar_with_ml: next_item("process_dstar_with_ml")?.parse_bool()?,
                lc_to_pkpi: next_item("process_lc_to_pkpi")?.parse_bool()?,
                lc_to_pkpi_with_ml: next_item("process_lc_to_pkpi_with_ml")?.parse_bool()?,
            },
            selection_flag_dstar: next_item("selection_flag_dstar_to_d0_pi")?.parse_bool()?,
            selection_flag_lc: next_item("selection_flag_lc_to_pkpi")?.parse::<i32>()?,
            num_bkg_rotations: next_item("n_bkg_rotations")?.parse::<usize>()?,
            histograms: HistogramSwitches {
                helicity: next_item("activate_helicity")?.parse_bool()?,
                production: next_item("activate_production")?.parse_bool()?,
                beam: next_item("activate_beam")?.parse_bool()?,
                random: next_item("activate_random")?.parse_bool()?,
            },
            random_sampling: next_item("random_axis_sampling")?.parse::<RandomAxisSampling>()?,
            rng_seed: next_item("rng_seed")?.parse::<u64>()?,
            axes: AxesConfig {
                inv_mass: next_item("axis_inv_mass")?.parse_binning()?,
                pt: next_item("axis_pt")?.parse_binning()?,
                pz: next_item("axis_pz")?.parse_binning()?,
                rapidity: next_item("axis_y")?.parse_binning()?,
                cos_theta_star_helicity: next_item("axis_cos_helicity")?.parse_binning()?,
                cos_theta_star_production: next_item("axis_cos_production")?.parse_binning()?,
                cos_theta_star_beam: next_item("axis_cos_beam")?.parse_binning()?,
                cos_theta_star_random: next_item("axis_cos_random")?.parse_binning()?,
                ml_bkg: next_item("axis_ml_bkg")?.parse_binning()?,
                ml_non_prompt: next_item("axis_ml_non_prompt")?.parse_binning()?,
                is_rotated: next_item("axis_is_rotated")?.parse_binning()?,
            },
        })
    }
}

/// A line from the configuration file, tagged with the struct field which it
/// is supposed to map for error reporting purposes.
struct ConfigItem<'data> {
    name: &'static str,
    tokens: std::str::SplitWhitespace<'data>,
}
//
impl<'data> ConfigItem<'data> {
    /// Build a config item from a struct field tag and a configuration line
    fn new(name: &'static str, line: &'data str) -> Self {
        Self {
            name,
            tokens: line.split_whitespace(),
        }
    }

    /// Extract the next raw value of this item
    fn next_token(&mut self) -> Result<&'data str> {
        let name = self.name;
        self.tokens
            .next()
            .ok_or_else(|| eyre!("Missing value in configuration of {}", name))
    }

    /// Extract the (first) raw value of this item
    fn first(mut self) -> Result<&'data str> {
        self.next_token()
    }

    /// Parse the next value using Rust's standard parsing logic
    fn parse_next<T: FromStr>(&mut self) -> Result<T>
    where
        <T as FromStr>::Err: Into<eyre::Report>,
    {
        let name = self.name;
        let parsed: Result<T> = self.next_token()?.parse::<T>().map_err(Into::into);
        parsed.wrap_err_with(|| format!("Could not parse configuration of {name}"))
    }

    /// Parse this item using Rust's standard parsing logic
    fn parse<T: FromStr>(mut self) -> Result<T>
    where
        <T as FromStr>::Err: Into<eyre::Report>,
    {
        self.parse_next::<T>()
    }

    /// Parse this item using special logic which handles Fortran's bool syntax
    fn parse_bool(self) -> Result<bool> {
        let name = self.name;
        let data = self.first()?;
        match data.to_lowercase().as_str() {
            // Handle FORTRAN booleans as a special case
            ".true." => Ok(true),
            ".false." => Ok(false),
            // Delegate other booleans to the standard Rust parser
            other => other
                .parse::<bool>()
                .wrap_err_with(|| format!("Could not parse configuration of {name}")),
        }
    }

    /// Parse an axis binning, given as "bins min max"
    fn parse_binning(mut self) -> Result<Binning> {
        let bins = self.parse_next::<usize>()?;
        let min = self.parse_next::<Float>()?;
        let max = self.parse_next::<Float>()?;
        ensure!(
            min < max,
            "Axis range of {} must be increasing, got [{min}, {max}]",
            self.name
        );
        Ok(Binning::new(bins, min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "\
data/candidates.txt   candidates_file
.false.               process_dstar
.false.               process_dstar_with_ml
.false.               process_lc_to_pkpi
.true.                process_lc_to_pkpi_with_ml

true                  selection_flag_dstar_to_d0_pi
2                     selection_flag_lc_to_pkpi
3                     n_bkg_rotations
.true.                activate_helicity
.false.               activate_production
true                  activate_beam
false                 activate_random
isotropic             random_axis_sampling
42                    rng_seed
100 2.2 2.4           axis_inv_mass
50 0 50               axis_pt
100 -50 50            axis_pz
20 -1 1               axis_y
20 -1 1               axis_cos_helicity
20 -1 1               axis_cos_production
10 -1 1               axis_cos_beam
20 -1 1               axis_cos_random
100 0 1               axis_ml_bkg
100 0 1               axis_ml_non_prompt
2 -0.5 1.5            axis_is_rotated
";

    #[test]
    fn parse_config() {
        let cfg = CONFIG.parse::<Configuration>().unwrap();
        assert_eq!(cfg.candidates_file, "data/candidates.txt");
        assert_eq!(cfg.validate().unwrap(), ProcessingMode::LcToPKPiWithMl);
        assert_eq!(cfg.selection_flag_lc, 2);
        assert_eq!(cfg.num_bkg_rotations, 3);
        assert_eq!(
            cfg.histograms.enabled().collect::<Vec<_>>(),
            vec![ReferenceAxis::Helicity, ReferenceAxis::Beam]
        );
        assert_eq!(cfg.random_sampling, RandomAxisSampling::Isotropic);
        assert_eq!(cfg.rng_seed, 42);
        assert_eq!(cfg.axes.inv_mass, Binning::new(100, 2.2, 2.4));
        assert_eq!(
            cfg.axes.cos_theta_star(ReferenceAxis::Beam),
            Binning::new(10, -1., 1.)
        );
    }

    #[test]
    fn parse_errors_name_the_item() {
        let truncated = CONFIG.lines().take(10).collect::<Vec<_>>().join("\n");
        let err = truncated.parse::<Configuration>().unwrap_err();
        assert!(err.to_string().contains("activate_production"));

        let bad_bool = CONFIG.replace(".true.                process_lc", "yes process_lc");
        let err = bad_bool.parse::<Configuration>().unwrap_err();
        assert!(err.to_string().contains("process_lc_to_pkpi_with_ml"));

        let bad_axis = CONFIG.replace("50 0 50", "50 50 0");
        assert!(bad_axis.parse::<Configuration>().is_err());

        let short_axis = CONFIG.replace("50 0 50", "50 0");
        assert!(short_axis.parse::<Configuration>().is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Configuration::default().validate().unwrap(), ProcessingMode::Dstar);
    }

    #[test]
    fn processing_mode_must_be_unique() {
        let mut cfg = Configuration::default();
        cfg.processes.dstar = false;
        assert!(cfg.validate().is_err());

        cfg.processes.dstar = true;
        cfg.processes.lc_to_pkpi = true;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn some_histogram_must_be_enabled() {
        let mut cfg = Configuration::default();
        cfg.histograms = HistogramSwitches {
            helicity: false,
            production: false,
            beam: false,
            random: false,
        };
        assert!(cfg.validate().is_err());
        cfg.histograms.random = true;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn axes_must_have_bins() {
        let mut cfg = Configuration::default();
        cfg.axes.pt = Binning::new(0, 0., 100.);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn processing_modes() {
        assert_eq!(ProcessingMode::Dstar.channel(), DecayChannel::DstarToD0Pi);
        assert!(!ProcessingMode::Dstar.with_ml());
        assert_eq!(ProcessingMode::LcToPKPiWithMl.channel(), DecayChannel::LcToPKPi);
        assert!(ProcessingMode::LcToPKPiWithMl.with_ml());
        assert!(ProcessingMode::DstarWithMl.with_ml());
    }
}
