// ==========================================
// Bedna workflow - header normalizer
// ==========================================
// Merged cells in customer sheets leave blank or repeated header
// names. Normalized headers are lowercase with single spaces,
// blanks become `column_<n>` (1-based position) and repeats get
// `.1`, `.2`, ... from left to right.
// ==========================================

use std::collections::{HashMap, HashSet};

pub struct HeaderNormalizer;

impl HeaderNormalizer {
    /// Suffixes skip names that appear literally anywhere in the row,
    /// so `a, a, a.1` becomes `a, a.2, a.1`
    pub fn normalize(raw: &[String]) -> Vec<String> {
        let bases: Vec<String> = raw
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let base = Self::canonical(header);
                if base.is_empty() {
                    format!("column_{}", idx + 1)
                } else {
                    base
                }
            })
            .collect();
        let literal: HashSet<&str> = bases.iter().map(String::as_str).collect();

        let mut taken: HashSet<String> = HashSet::with_capacity(bases.len());
        let mut next_suffix: HashMap<&str, usize> = HashMap::new();
        let mut normalized = Vec::with_capacity(bases.len());
        for base in &bases {
            if taken.insert(base.clone()) {
                normalized.push(base.clone());
                continue;
            }
            let suffix = next_suffix.entry(base.as_str()).or_insert(1);
            loop {
                let candidate = format!("{}.{}", base, suffix);
                *suffix += 1;
                if !literal.contains(candidate.as_str()) && taken.insert(candidate.clone()) {
                    normalized.push(candidate);
                    break;
                }
            }
        }
        normalized
    }

    /// Lowercase, trimmed, inner whitespace collapsed
    pub fn canonical(header: &str) -> String {
        header
            .trim_start_matches('\u{feff}')
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}
