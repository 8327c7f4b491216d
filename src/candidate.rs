//! This module defines the properties and storage of reconstructed decay
//! candidates, as handed over by the upstream reconstruction and selection

use crate::{
    momentum::ThreeMomentum,
    numeric::Float,
    Result,
};

use eyre::{bail, ensure, eyre, WrapErr};

use std::{fmt, fs, str::FromStr};

/// Decay channels supported by the analysis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecayChannel {
    /// D*+ → D0 π+, polarisation measured from the soft pion
    DstarToD0Pi,

    /// Λc+ → p K- π+, polarisation measured from the proton
    LcToPKPi,
}
//
impl DecayChannel {
    /// Truth that the channel's decay products can be recombined after
    /// rotating one of them, which is needed for the rotational background
    pub fn supports_rotation(self) -> bool {
        match self {
            Self::DstarToD0Pi => false,
            Self::LcToPKPi => true,
        }
    }
}
//
impl fmt::Display for DecayChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DstarToD0Pi => write!(f, "D*+ -> D0 pi+"),
            Self::LcToPKPi => write!(f, "Lc+ -> p K- pi+"),
        }
    }
}

/// Number of classifier output scores per mass hypothesis
pub const NUM_ML_SCORES: usize = 3;

/// Classifier output scores of a candidate under one mass hypothesis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MlScores([Float; NUM_ML_SCORES]);
//
impl MlScores {
    /// Wrap (background, prompt, non-prompt) scores
    pub fn new(scores: [Float; NUM_ML_SCORES]) -> Self {
        Self(scores)
    }

    /// Background-likeness
    pub fn background(&self) -> Float {
        self.0[0]
    }

    /// Non-prompt signal-likeness
    pub fn non_prompt(&self) -> Float {
        self.0[2]
    }
}

/// D*+ → D0 π+ candidate
#[derive(Clone, Debug, PartialEq)]
pub struct DstarCandidate {
    /// Momentum of the soft pion
    pub p_soft_pi: ThreeMomentum,

    /// Momentum of the D* itself
    pub p_dstar: ThreeMomentum,

    /// Electric charge sign of the soft pion, which tells D*+ from D*-
    pub sign_soft_pi: i8,

    /// Invariant mass under the D*+ hypothesis
    pub inv_mass_dstar: Float,

    /// Invariant mass under the D*- hypothesis
    pub inv_mass_anti_dstar: Float,

    /// Invariant mass of the D0 daughter
    pub inv_mass_d0: Float,

    /// Invariant mass of the anti-D0 daughter
    pub inv_mass_d0_bar: Float,

    /// Outcome of the upstream D* selection
    pub is_selected: bool,

    /// Classifier scores, if the upstream selection computed them
    pub ml_scores: Option<MlScores>,
}

/// Λc+ → p K- π+ candidate
///
/// The proton and the pion cannot be told apart by the reconstruction, so
/// prongs 0 and 2 are either (p, π) or (π, p). Prong 1 is always the kaon.
///
#[derive(Clone, Debug, PartialEq)]
pub struct LcCandidate {
    /// Momenta of the three prongs
    pub prongs: [ThreeMomentum; 3],

    /// Invariant mass under the p K π assignment
    pub inv_mass_pkpi: Float,

    /// Invariant mass under the π K p assignment
    pub inv_mass_pikp: Float,

    /// Selection level reached under the p K π assignment
    pub sel_pkpi: i32,

    /// Selection level reached under the π K p assignment
    pub sel_pikp: i32,

    /// Classifier scores under the p K π assignment
    pub ml_scores_pkpi: Option<MlScores>,

    /// Classifier scores under the π K p assignment
    pub ml_scores_pikp: Option<MlScores>,
}
//
impl LcCandidate {
    /// Momentum of the Λc, i.e. vector sum of the prong momenta
    pub fn momentum(&self) -> ThreeMomentum {
        self.prongs.iter().sum()
    }
}

/// Reconstructed decay candidate
#[derive(Clone, Debug, PartialEq)]
pub enum Candidate {
    /// D*+ → D0 π+ candidate
    Dstar(DstarCandidate),

    /// Λc+ → p K- π+ candidate
    LcToPKPi(LcCandidate),
}
//
impl Candidate {
    /// Decay channel of this candidate
    pub fn channel(&self) -> DecayChannel {
        match self {
            Self::Dstar(_) => DecayChannel::DstarToD0Pi,
            Self::LcToPKPi(_) => DecayChannel::LcToPKPi,
        }
    }
}
//
impl FromStr for Candidate {
    type Err = eyre::Report;

    /// Decode one line of the candidate file (see `load`)
    fn from_str(line: &str) -> Result<Self> {
        let mut fields = Fields::new(line);
        let tag = fields.next_raw("channel tag")?;
        let candidate = match tag {
            "dstar" => Self::Dstar(DstarCandidate {
                p_soft_pi: fields.next_momentum("soft pion momentum")?,
                p_dstar: fields.next_momentum("D* momentum")?,
                sign_soft_pi: {
                    let sign = fields.next::<i8>("soft pion sign")?;
                    ensure!(sign == 1 || sign == -1, "Soft pion sign must be +1 or -1");
                    sign
                },
                inv_mass_dstar: fields.next_float("D*+ mass")?,
                inv_mass_anti_dstar: fields.next_float("D*- mass")?,
                inv_mass_d0: fields.next_float("D0 mass")?,
                inv_mass_d0_bar: fields.next_float("anti-D0 mass")?,
                is_selected: fields.next::<u8>("D* selection flag")? != 0,
                ml_scores: if fields.is_empty() {
                    None
                } else {
                    Some(fields.next_scores("D* scores")?)
                },
            }),
            "lc" => Self::LcToPKPi(LcCandidate {
                prongs: [
                    fields.next_momentum("prong 0 momentum")?,
                    fields.next_momentum("prong 1 momentum")?,
                    fields.next_momentum("prong 2 momentum")?,
                ],
                inv_mass_pkpi: fields.next_float("pKpi mass")?,
                inv_mass_pikp: fields.next_float("piKp mass")?,
                sel_pkpi: fields.next::<i32>("pKpi selection level")?,
                sel_pikp: fields.next::<i32>("piKp selection level")?,
                ml_scores_pkpi: fields.next_optional_scores("pKpi scores")?,
                ml_scores_pikp: fields.next_optional_scores("piKp scores")?,
            }),
            other => bail!("Unknown candidate type {other:?}"),
        };
        fields.finish()?;
        Ok(candidate)
    }
}

/// Load candidates from a text file
///
/// Each non-blank line describes one candidate, and anything after a '#' is
/// a comment. The line format depends on the decay channel:
///
/// ```text
/// dstar px_pi py_pi pz_pi px py pz sign m_dstar m_antidstar m_d0 m_d0bar sel [s0 s1 s2]
/// lc px0 py0 pz0 px1 py1 pz1 px2 py2 pz2 m_pkpi m_pikp sel_pkpi sel_pikp [none|s0 s1 s2] [none|s0 s1 s2]
/// ```
///
pub fn load(file_name: &str) -> Result<Vec<Candidate>> {
    let contents = fs::read_to_string(file_name)
        .wrap_err_with(|| format!("Could not read candidate file {file_name}"))?;
    parse_all(&contents).wrap_err_with(|| format!("Invalid candidate file {file_name}"))
}

/// Decode all candidates from the contents of a candidate file
pub fn parse_all(contents: &str) -> Result<Vec<Candidate>> {
    contents
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.split('#').next().unwrap_or_default().trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line_no, line)| {
            line.parse::<Candidate>()
                .wrap_err_with(|| format!("Could not decode candidate on line {line_no}"))
        })
        .collect()
}

/// Whitespace-separated fields of a candidate line, fetched in order and
/// tagged with a name for error reporting purposes
struct Fields<'data> {
    tokens: std::iter::Peekable<std::str::SplitWhitespace<'data>>,
}
//
impl<'data> Fields<'data> {
    fn new(line: &'data str) -> Self {
        Self {
            tokens: line.split_whitespace().peekable(),
        }
    }

    fn is_empty(&mut self) -> bool {
        self.tokens.peek().is_none()
    }

    fn next_raw(&mut self, name: &str) -> Result<&'data str> {
        self.tokens.next().ok_or_else(|| eyre!("Missing {name}"))
    }

    fn next<T: FromStr>(&mut self, name: &str) -> Result<T>
    where
        <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        let raw = self.next_raw(name)?;
        raw.parse::<T>()
            .wrap_err_with(|| format!("Could not parse {name} from {raw:?}"))
    }

    fn next_float(&mut self, name: &str) -> Result<Float> {
        let value = self.next::<Float>(name)?;
        ensure!(value.is_finite(), "{name} must be finite, got {value}");
        Ok(value)
    }

    fn next_momentum(&mut self, name: &str) -> Result<ThreeMomentum> {
        Ok(ThreeMomentum::new(
            self.next_float(name)?,
            self.next_float(name)?,
            self.next_float(name)?,
        ))
    }

    /// Scores come as complete triples, partial ones are rejected
    fn next_scores(&mut self, name: &str) -> Result<MlScores> {
        let mut scores = [0.; NUM_ML_SCORES];
        for (idx, score) in scores.iter_mut().enumerate() {
            *score = self
                .next_float(name)
                .wrap_err_with(|| format!("Incomplete {name}: expected {NUM_ML_SCORES} values, got {idx}"))?;
        }
        Ok(MlScores::new(scores))
    }

    fn next_optional_scores(&mut self, name: &str) -> Result<Option<MlScores>> {
        match self.tokens.peek() {
            None => Ok(None),
            Some(&"none") => {
                self.tokens.next();
                Ok(None)
            }
            Some(_) => self.next_scores(name).map(Some),
        }
    }

    fn finish(mut self) -> Result<()> {
        match self.tokens.next() {
            None => Ok(()),
            Some(extra) => bail!("Unexpected trailing data starting at {extra:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DSTAR_LINE: &str = "dstar 1 0 0  2 0 0  1  2.01 2.02 1.865 1.866  1";
    const LC_LINE: &str = "lc 1 0 0.5  0.5 0.5 0  0.25 -0.25 0.25  2.28 2.31  1 0  0.1 0.8 0.1  none";

    #[test]
    fn parse_dstar() {
        let cand = DSTAR_LINE.parse::<Candidate>().unwrap();
        let Candidate::Dstar(dstar) = cand else {
            panic!("Expected a D* candidate")
        };
        assert_eq!(dstar.p_soft_pi, ThreeMomentum::new(1., 0., 0.));
        assert_eq!(dstar.p_dstar, ThreeMomentum::new(2., 0., 0.));
        assert_eq!(dstar.sign_soft_pi, 1);
        assert_eq!(dstar.inv_mass_d0_bar, 1.866);
        assert!(dstar.is_selected);
        assert_eq!(dstar.ml_scores, None);

        let with_scores = format!("{DSTAR_LINE} 0.1 0.2 0.7");
        let Candidate::Dstar(dstar) = with_scores.parse::<Candidate>().unwrap() else {
            panic!("Expected a D* candidate")
        };
        assert_eq!(dstar.ml_scores, Some(MlScores::new([0.1, 0.2, 0.7])));
    }

    #[test]
    fn parse_lc() {
        let cand = LC_LINE.parse::<Candidate>().unwrap();
        assert_eq!(cand.channel(), DecayChannel::LcToPKPi);
        let Candidate::LcToPKPi(lc) = cand else {
            panic!("Expected a Lc candidate")
        };
        assert_eq!(lc.prongs[2], ThreeMomentum::new(0.25, -0.25, 0.25));
        assert_eq!((lc.sel_pkpi, lc.sel_pikp), (1, 0));
        assert_eq!(lc.ml_scores_pkpi, Some(MlScores::new([0.1, 0.8, 0.1])));
        assert_eq!(lc.ml_scores_pikp, None);
        assert_eq!(lc.momentum(), ThreeMomentum::new(1.75, 0.25, 0.75));
    }

    #[test]
    fn score_roles() {
        let scores = MlScores::new([0.6, 0.3, 0.1]);
        assert_eq!(scores.background(), 0.6);
        assert_eq!(scores.non_prompt(), 0.1);
    }

    #[test]
    fn partial_scores_are_rejected() {
        assert!(format!("{DSTAR_LINE} 0.1 0.2").parse::<Candidate>().is_err());
        assert!("lc 1 0 0 0 1 0 0 0 1 2.28 2.31 1 1 0.1 0.2 none"
            .parse::<Candidate>()
            .is_err());
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!("dzero 1 2 3".parse::<Candidate>().is_err());
        assert!("dstar 1 0 0 2 0 0 1 2.01".parse::<Candidate>().is_err());
        assert!("dstar 1 0 0 2 0 0 0 2.01 2.02 1.865 1.866 1"
            .parse::<Candidate>()
            .is_err());
        assert!("dstar 1 0 nan 2 0 0 1 2.01 2.02 1.865 1.866 1"
            .parse::<Candidate>()
            .is_err());
        assert!(format!("{LC_LINE} none").parse::<Candidate>().is_err());
    }

    #[test]
    fn comments_and_blank_lines() {
        let contents = format!("# header\n\n{DSTAR_LINE} # trailing comment\n   \n{LC_LINE}\n");
        let candidates = parse_all(&contents).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].channel(), DecayChannel::DstarToD0Pi);

        let err = parse_all(&format!("{DSTAR_LINE}\nlc 1 2\n")).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
