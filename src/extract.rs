//! Unit extraction from build-tool dry-run transcripts.
//!
//! Each library's make system prints its planned compile actions in its own
//! shape. A [`Grammar`] names the pattern that finds the unit stems in that
//! output, and [`Exclusions`] drops the units that don't belong in a library
//! build (tests, tools, fuzzers, the program entry point).

use std::collections::HashSet;

use regex::Regex;

/// Pattern grammar for one library's dry-run output.
///
/// The pattern's first capture group is the unit stem (the path without the
/// `.c` suffix).
#[derive(Debug, Clone, Copy)]
pub struct Grammar {
    /// Human-readable description for error messages.
    pub describes: &'static str,
    pub pattern: &'static str,
}

/// Units dropped from the extracted set, applied in field order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exclusions {
    /// Stems starting with any of these are dropped.
    pub prefixes: &'static [&'static str],
    /// The stem ending in this names the program entry point and is dropped.
    pub entry_point: Option<&'static str>,
}

impl Exclusions {
    pub const NONE: Exclusions = Exclusions {
        prefixes: &[],
        entry_point: None,
    };

    pub fn excludes(&self, stem: &str) -> bool {
        if self.prefixes.iter().any(|p| stem.starts_with(p)) {
            return true;
        }
        matches!(self.entry_point, Some(entry) if stem.ends_with(entry))
    }
}

/// Outcome of scanning a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Ordered unique stems that survived the exclusions.
    Units(Vec<String>),
    /// The grammar matched nothing at all.
    NoMatch,
}

/// Extract ordered, de-duplicated unit stems from a transcript.
///
/// First-occurrence order is kept. A grammar that matches nothing yields
/// [`Extracted::NoMatch`]; a grammar whose every match is excluded yields an
/// empty unit list.
pub fn extract(
    transcript: &str,
    grammar: &Grammar,
    exclusions: &Exclusions,
) -> Result<Extracted, regex::Error> {
    let re = Regex::new(grammar.pattern)?;

    let mut seen = HashSet::new();
    let mut matched = false;
    let mut units = Vec::new();

    for caps in re.captures_iter(transcript) {
        let Some(stem) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        matched = true;
        if !seen.insert(stem) {
            continue;
        }
        if exclusions.excludes(stem) {
            continue;
        }
        units.push(stem.to_string());
    }

    Ok(if matched {
        Extracted::Units(units)
    } else {
        Extracted::NoMatch
    })
}
