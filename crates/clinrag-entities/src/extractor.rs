use std::collections::HashSet;

use regex::{Captures, Regex};

use clinrag_core::error::{Error, Result};

use crate::synonyms::{SynonymResolver, SynonymTable};

/// Twelve regular meridians plus the Governing and Conception vessels,
/// followed by one or two digits with an optional space and/or hyphen between.
/// Extra points use `EX-<region><n>`.
const CODE_PATTERN: &str = r"(?i)\b(?:EX\s?-?\s?(?P<region>HN|CA|UE|LE|B)\s?-?\s?(?P<ex>\d{1,2})|(?P<prefix>LU|LI|ST|SP|HT|SI|BL|KI|PC|TE|GB|LR|GV|CV)\s?-?\s?(?P<num>\d{1,2}))\b";

const SYNONYM_PASS: u8 = 0;
const CODE_PASS: u8 = 1;

/// Recognises acupuncture point references in free text.
///
/// Output is deduplicated and ordered by first appearance across the synonym
/// pass and the code pass; a tie at the same offset goes to the synonym pass.
pub struct EntityExtractor {
    synonyms: SynonymResolver,
    codes: Regex,
}

impl EntityExtractor {
    pub fn new(table: SynonymTable) -> Result<Self> {
        let synonyms = SynonymResolver::new(table)?;
        let codes = Regex::new(CODE_PATTERN).map_err(|e| Error::InvalidConfig(format!("point code pattern: {e}")))?;
        Ok(Self { synonyms, codes })
    }

    pub fn with_builtin_synonyms() -> Result<Self> {
        Self::new(SynonymTable::builtin())
    }

    pub fn synonyms(&self) -> &SynonymResolver {
        &self.synonyms
    }

    pub fn extract(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        // (offset, pass, order within pass, code)
        let mut hits: Vec<(usize, u8, usize, String)> = self
            .synonyms
            .hits(text)
            .into_iter()
            .map(|h| (h.start, SYNONYM_PASS, h.entry, h.code.to_string()))
            .collect();
        for (i, caps) in self.codes.captures_iter(text).enumerate() {
            let Some(code) = canonical(&caps) else { continue };
            let start = caps.get(0).map_or(0, |m| m.start());
            hits.push((start, CODE_PASS, i, code));
        }
        hits.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

        let mut seen = HashSet::new();
        hits.into_iter().filter_map(|(_, _, _, code)| seen.insert(code.clone()).then_some(code)).collect()
    }

    /// Canonical form of a single code-shaped string, e.g. `"li - 04"` → `"LI4"`.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        let caps = self.codes.captures(raw)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != raw.len() {
            return None;
        }
        canonical(&caps)
    }
}

fn canonical(caps: &Captures<'_>) -> Option<String> {
    if let (Some(prefix), Some(num)) = (caps.name("prefix"), caps.name("num")) {
        let n: u8 = num.as_str().parse().ok().filter(|n| *n > 0)?;
        return Some(format!("{}{}", prefix.as_str().to_uppercase(), n));
    }
    let region = caps.name("region")?;
    let n: u8 = caps.name("ex")?.as_str().parse().ok().filter(|n| *n > 0)?;
    Some(format!("EX-{}{}", region.as_str().to_uppercase(), n))
}
