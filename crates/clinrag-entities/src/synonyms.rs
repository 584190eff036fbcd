use std::collections::{BTreeMap, BTreeSet};

use aho_corasick::{AhoCorasick, MatchKind};
use tracing::debug;

use clinrag_core::error::{Error, Result};
use clinrag_core::types::SynonymEntry;

/// Pinyin and English point names → canonical codes.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("zusanli", "ST36"),
    ("leg three miles", "ST36"),
    ("hegu", "LI4"),
    ("union valley", "LI4"),
    ("quchi", "LI11"),
    ("pool at the bend", "LI11"),
    ("sanyinjiao", "SP6"),
    ("three yin intersection", "SP6"),
    ("taichong", "LR3"),
    ("great surge", "LR3"),
    ("neiguan", "PC6"),
    ("inner pass", "PC6"),
    ("waiguan", "TE5"),
    ("outer pass", "TE5"),
    ("shenmen", "HT7"),
    ("spirit gate", "HT7"),
    ("lieque", "LU7"),
    ("broken sequence", "LU7"),
    ("zhaohai", "KI6"),
    ("shining sea", "KI6"),
    ("taixi", "KI3"),
    ("great ravine", "KI3"),
    ("baihui", "GV20"),
    ("hundred meetings", "GV20"),
    ("dazhui", "GV14"),
    ("great hammer", "GV14"),
    ("renzhong", "GV26"),
    ("shuigou", "GV26"),
    ("shanzhong", "CV17"),
    ("chest center", "CV17"),
    ("qihai", "CV6"),
    ("sea of qi", "CV6"),
    ("guanyuan", "CV4"),
    ("gate of origin", "CV4"),
    ("zhongwan", "CV12"),
    ("middle cavity", "CV12"),
    ("yanglingquan", "GB34"),
    ("yang mound spring", "GB34"),
    ("xuanzhong", "GB39"),
    ("suspended bell", "GB39"),
    ("fengchi", "GB20"),
    ("wind pool", "GB20"),
    ("xuehai", "SP10"),
    ("sea of blood", "SP10"),
    ("yinlingquan", "SP9"),
    ("yin mound spring", "SP9"),
    ("fenglong", "ST40"),
    ("abundant bulge", "ST40"),
    ("tianshu", "ST25"),
    ("heavenly pivot", "ST25"),
    ("yintang", "EX-HN3"),
    ("hall of impression", "EX-HN3"),
    ("taiyang", "EX-HN5"),
    ("anmian", "Anmian"),
];

/// Immutable alias table, injected at construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymTable {
    entries: Vec<SynonymEntry>,
}

impl SynonymTable {
    /// Empty aliases are dropped; identical `(alias, code)` pairs are kept once.
    /// One alias may map to several codes; every one of them resolves.
    pub fn new(entries: impl IntoIterator<Item = SynonymEntry>) -> Self {
        let mut seen = BTreeSet::new();
        let entries = entries
            .into_iter()
            .map(|e| SynonymEntry::new(&e.alias, e.canonical_code))
            .filter(|e| !e.alias.is_empty() && !e.canonical_code.is_empty())
            .filter(|e| seen.insert((e.alias.clone(), e.canonical_code.clone())))
            .collect();
        Self { entries }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_ALIASES.iter().map(|(alias, code)| SynonymEntry::new(alias, *code)))
    }

    /// Layer configured `alias = "CODE"` pairs over this table. A configured
    /// alias replaces every existing mapping for the same alias.
    pub fn with_overrides(self, overrides: &BTreeMap<String, String>) -> Self {
        let overridden: BTreeSet<String> = overrides.keys().map(|a| a.trim().to_lowercase()).collect();
        let kept = self.entries.into_iter().filter(|e| !overridden.contains(&e.alias));
        let added = overrides.iter().map(|(alias, code)| SynonymEntry::new(alias, code.trim()));
        Self::new(kept.chain(added))
    }

    pub fn entries(&self) -> &[SynonymEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single alias hit inside a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasHit<'a> {
    /// Byte offset of the hit in the scanned text.
    pub start: usize,
    /// Position of the alias in the table.
    pub entry: usize,
    pub code: &'a str,
}

/// Case-insensitive substring matcher over every alias at once.
///
/// Aliases are stored lowercased and the automaton runs over a lowercased
/// copy of the text, so folding covers non-ASCII letters (tone-marked pinyin).
/// Matches are overlapping so that an alias nested in a longer one still
/// resolves; this favours recall and lets ambiguous text yield every code.
pub struct SynonymResolver {
    table: SynonymTable,
    matcher: Option<AhoCorasick>,
}

impl SynonymResolver {
    pub fn new(table: SynonymTable) -> Result<Self> {
        let matcher = if table.is_empty() {
            None
        } else {
            let automaton = AhoCorasick::builder()
                .match_kind(MatchKind::Standard)
                .build(table.entries().iter().map(|e| e.alias.as_str()))
                .map_err(|e| Error::InvalidConfig(format!("synonym table: {e}")))?;
            Some(automaton)
        };
        debug!(aliases = table.len(), "synonym matcher built");
        Ok(Self { table, matcher })
    }

    pub fn table(&self) -> &SynonymTable {
        &self.table
    }

    /// Canonical codes of every alias found in `text`.
    pub fn resolve(&self, text: &str) -> BTreeSet<String> {
        self.hits(text).into_iter().map(|h| h.code.to_string()).collect()
    }

    /// Every alias occurrence, in scan order. Offsets refer to `text`.
    pub fn hits<'a>(&'a self, text: &str) -> Vec<AliasHit<'a>> {
        let Some(matcher) = &self.matcher else { return Vec::new() };
        let folded = Folded::new(text);
        matcher
            .find_overlapping_iter(&folded.text)
            .map(|m| {
                let entry = m.pattern().as_usize();
                AliasHit {
                    start: folded.original_offset(m.start()),
                    entry,
                    code: self.table.entries()[entry].canonical_code.as_str(),
                }
            })
            .collect()
    }
}

/// Lowercased text plus, for each of its bytes, the byte offset of the
/// source char it came from.
struct Folded {
    text: String,
    origin: Vec<usize>,
    source_len: usize,
}

impl Folded {
    fn new(source: &str) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut origin = Vec::with_capacity(source.len());
        for (offset, ch) in source.char_indices() {
            let before = text.len();
            text.extend(ch.to_lowercase());
            origin.resize(origin.len() + (text.len() - before), offset);
        }
        Self { text, origin, source_len: source.len() }
    }

    fn original_offset(&self, folded: usize) -> usize {
        self.origin.get(folded).copied().unwrap_or(self.source_len)
    }
}
