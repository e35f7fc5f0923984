//! Rule sets: ko, scoring, suicide, group tax, button and handicap bonus.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_KOMI, MAX_ARR_SIZE};
use crate::error::RulesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KoRule {
    /// Only immediate single-stone recapture is forbidden.
    Simple,
    /// No move may recreate an earlier board position.
    Positional,
    /// No move may recreate an earlier position with the same player to move.
    Situational,
    /// Simple ko, with passes lifting bans and repeated positions after a pass ending the phase.
    Spight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScoringRule {
    Area,
    Territory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxRule {
    None,
    /// Points in seki are not counted.
    Seki,
    /// Seki points are not counted and each independent group pays two points.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WhiteHandicapBonusRule {
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "N")]
    N,
    #[serde(rename = "N-1")]
    NMinusOne,
}

impl KoRule {
    pub fn idx(self) -> usize {
        self as usize
    }
}

impl ScoringRule {
    pub fn idx(self) -> usize {
        self as usize
    }
}

impl TaxRule {
    pub fn idx(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rules {
    pub ko: KoRule,
    pub scoring: ScoringRule,
    pub tax: TaxRule,
    #[serde(rename = "suicide")]
    pub multi_stone_suicide_legal: bool,
    pub has_button: bool,
    #[serde(rename = "whiteHandicapBonus")]
    pub white_handicap_bonus_rule: WhiteHandicapBonusRule,
    pub komi: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Rules::tromp_taylor()
    }
}

const PRESET_NAMES: &[&str] = &[
    "tromp-taylor",
    "chinese",
    "japanese",
    "korean",
    "aga",
    "aga-button",
    "new-zealand",
    "stone-scoring",
];

impl Rules {
    pub fn tromp_taylor() -> Self {
        Rules {
            ko: KoRule::Positional,
            scoring: ScoringRule::Area,
            tax: TaxRule::None,
            multi_stone_suicide_legal: true,
            has_button: false,
            white_handicap_bonus_rule: WhiteHandicapBonusRule::Zero,
            komi: DEFAULT_KOMI,
        }
    }

    pub fn chinese() -> Self {
        Rules {
            ko: KoRule::Simple,
            scoring: ScoringRule::Area,
            tax: TaxRule::None,
            multi_stone_suicide_legal: false,
            has_button: false,
            white_handicap_bonus_rule: WhiteHandicapBonusRule::N,
            komi: 7.5,
        }
    }

    pub fn japanese() -> Self {
        Rules {
            ko: KoRule::Simple,
            scoring: ScoringRule::Territory,
            tax: TaxRule::Seki,
            multi_stone_suicide_legal: false,
            has_button: false,
            white_handicap_bonus_rule: WhiteHandicapBonusRule::Zero,
            komi: 6.5,
        }
    }

    pub fn aga() -> Self {
        Rules {
            ko: KoRule::Situational,
            scoring: ScoringRule::Area,
            tax: TaxRule::None,
            multi_stone_suicide_legal: false,
            has_button: false,
            white_handicap_bonus_rule: WhiteHandicapBonusRule::NMinusOne,
            komi: 7.5,
        }
    }

    pub fn new_zealand() -> Self {
        Rules {
            ko: KoRule::Situational,
            scoring: ScoringRule::Area,
            tax: TaxRule::None,
            multi_stone_suicide_legal: true,
            has_button: false,
            white_handicap_bonus_rule: WhiteHandicapBonusRule::Zero,
            komi: 7.5,
        }
    }

    pub fn stone_scoring() -> Self {
        Rules {
            ko: KoRule::Simple,
            scoring: ScoringRule::Area,
            tax: TaxRule::All,
            multi_stone_suicide_legal: false,
            has_button: false,
            white_handicap_bonus_rule: WhiteHandicapBonusRule::Zero,
            komi: 7.5,
        }
    }

    /// Look up a preset by name, ignoring case, `_` versus `-`, and spaces.
    pub fn preset(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase().replace(['_', ' '], "-");
        let rules = match key.as_str() {
            "tromp-taylor" | "tromptaylor" => Rules::tromp_taylor(),
            "chinese" => Rules::chinese(),
            "japanese" | "korean" => Rules::japanese(),
            "aga" => Rules::aga(),
            "aga-button" => Rules {
                has_button: true,
                komi: 7.0,
                ..Rules::aga()
            },
            "new-zealand" | "nz" => Rules::new_zealand(),
            "stone-scoring" => Rules::stone_scoring(),
            _ => return None,
        };
        Some(rules)
    }

    /// Name of the preset these rules match, ignoring komi.
    pub fn preset_name(&self) -> Option<&'static str> {
        PRESET_NAMES.iter().copied().find(|name| {
            Rules::preset(name).is_some_and(|preset| Rules { komi: self.komi, ..preset } == *self)
        })
    }

    /// Komi is a finite multiple of 0.5 within the board-size bound.
    pub fn is_valid_komi(komi: f32) -> bool {
        komi.is_finite() && (komi * 2.0).fract() == 0.0 && komi.abs() <= MAX_ARR_SIZE as f32
    }

    pub fn with_komi(self, komi: f32) -> Result<Self, RulesError> {
        if !Rules::is_valid_komi(komi) {
            return Err(RulesError::InvalidKomi(komi));
        }
        Ok(Rules { komi, ..self })
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn parse_json(s: &str) -> Result<Self, RulesError> {
        let rules: Rules = serde_json::from_str(s)?;
        if !Rules::is_valid_komi(rules.komi) {
            return Err(RulesError::InvalidKomi(rules.komi));
        }
        Ok(rules)
    }
}

impl fmt::Display for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.preset_name() {
            Some(name) => write!(f, "{name} komi {}", self.komi),
            None => f.write_str(&self.to_json_string()),
        }
    }
}

impl FromStr for Rules {
    type Err = RulesError;

    /// Accepts a preset name, optionally followed by `komi <value>`, or a
    /// JSON object.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('{') {
            return Rules::parse_json(s);
        }
        let (name, komi) = match s.split_once(" komi ") {
            Some((name, komi)) => (name, Some(komi)),
            None => (s, None),
        };
        let rules = Rules::preset(name).ok_or_else(|| RulesError::Unknown(s.to_string()))?;
        match komi {
            Some(k) => {
                let k: f32 = k.trim().parse().map_err(|_| RulesError::Unknown(s.to_string()))?;
                rules.with_komi(k)
            }
            None => Ok(rules),
        }
    }
}
