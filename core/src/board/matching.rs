use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::board::pcb::Board;
use crate::prelude::{ToolError, ToolResult};
use crate::telemetry::log::LogManager;

const PLACEHOLDER: &str = "{n}";

/// Net-name template with a `{n}` placeholder for the numeric suffix shared
/// by both halves of a matched pair, e.g. `Net-(U2-A{n})`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetPattern {
    prefix: String,
    suffix: String,
}

impl NetPattern {
    pub fn new(template: &str) -> ToolResult<Self> {
        let mut parts = template.split(PLACEHOLDER);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(suffix), None) => Ok(Self {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            }),
            _ => Err(ToolError::InvalidInput(format!(
                "net pattern '{}' needs exactly one {} placeholder",
                template, PLACEHOLDER
            ))),
        }
    }

    /// Numeric suffix of `name` when it fits the template.
    pub fn match_suffix(&self, name: &str) -> Option<NetSuffix> {
        let digits = name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(NetSuffix(digits.to_string()))
    }

    pub fn render(&self, suffix: &NetSuffix) -> String {
        format!("{}{}{}", self.prefix, suffix, self.suffix)
    }
}

/// Digits substituted for `{n}`, kept as written so `A01` and `A1` stay
/// distinct. Orders by numeric value, then by text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NetSuffix(String);

impl NetSuffix {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for NetSuffix {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.0.trim_start_matches('0');
        let rhs = other.0.trim_start_matches('0');
        lhs.len()
            .cmp(&rhs.len())
            .then_with(|| lhs.cmp(rhs))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for NetSuffix {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NetSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NetPattern {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for NetPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prefix, PLACEHOLDER, self.suffix)
    }
}

/// Two nets that form one routed signal, e.g. both sides of a series
/// resistor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedPair {
    pub suffix: NetSuffix,
    pub first_net: String,
    pub second_net: String,
    pub first_mm: f64,
    pub second_mm: f64,
    pub total_mm: f64,
}

impl fmt::Display for MatchedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Combined Net: {} and {}, Total Trace Length: {:.4} mm",
            self.first_net, self.second_net, self.total_mm
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthReport {
    pub pairs: Vec<MatchedPair>,
    pub longest_mm: f64,
}

impl LengthReport {
    /// How much shorter the pair is than the longest one.
    pub fn skew(&self, pair: &MatchedPair) -> f64 {
        self.longest_mm - pair.total_mm
    }

    pub fn exceeding(&self, tolerance_mm: f64) -> Vec<&MatchedPair> {
        self.pairs
            .iter()
            .filter(|pair| self.skew(pair) > tolerance_mm)
            .collect()
    }
}

/// Pairs routed nets that share a numeric suffix under the two patterns and
/// sums their track lengths. Pairs come out in ascending suffix order.
pub fn match_lengths(board: &Board, first: &NetPattern, second: &NetPattern) -> LengthReport {
    let logger = LogManager::new("length-match");
    let mut first_nets: BTreeMap<NetSuffix, (u32, &str)> = BTreeMap::new();
    let mut second_nets: BTreeMap<NetSuffix, (u32, &str)> = BTreeMap::new();

    for (code, name) in board.routed_nets() {
        for (pattern, nets) in [(first, &mut first_nets), (second, &mut second_nets)] {
            let Some(suffix) = pattern.match_suffix(name) else {
                continue;
            };
            match nets.entry(suffix) {
                Entry::Vacant(slot) => {
                    slot.insert((code, name));
                }
                Entry::Occupied(kept) => logger.warn(&format!(
                    "net {} ({}) duplicates {} ({}), keeping the first",
                    name,
                    code,
                    kept.get().1,
                    kept.get().0
                )),
            }
        }
    }

    let mut pairs = Vec::new();
    for (suffix, &(first_code, first_name)) in &first_nets {
        let Some(&(second_code, second_name)) = second_nets.get(suffix) else {
            logger.trace(&format!(
                "{} has no partner {}",
                first_name,
                second.render(suffix)
            ));
            continue;
        };
        let first_mm = board.net_length(first_code);
        let second_mm = board.net_length(second_code);
        pairs.push(MatchedPair {
            suffix: suffix.clone(),
            first_net: first_name.to_string(),
            second_net: second_name.to_string(),
            first_mm,
            second_mm,
            total_mm: first_mm + second_mm,
        });
    }

    let longest_mm = pairs.iter().map(|pair| pair.total_mm).fold(0.0, f64::max);
    logger.record(&format!(
        "matched {} pairs of {} / {}",
        pairs.len(),
        first,
        second
    ));
    LengthReport { pairs, longest_mm }
}
