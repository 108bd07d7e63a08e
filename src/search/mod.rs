//! Client-side search over the static JSON artifact.
//!
//! The engine loads the artifact once, builds a single in-memory index, and
//! then serves every query synchronously. Load failures are swallowed: a
//! broken or missing artifact leaves the engine permanently not-ready and
//! every query returns nothing, so search degrades to "unavailable" instead
//! of blocking content display.

pub mod builder;
pub mod state;
pub mod tokenizer;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query};
use tantivy::schema::*;
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument, Term};

use crate::error::GardenError;
use tokenizer::{tokenize, GardenTokenizer};

/// One record of the search artifact.
///
/// `id` is the note's title, not its slug: the UI joins search results to
/// displayed nodes by title. Two notes with identical titles collide here;
/// see DESIGN.md before "fixing" this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDoc {
    pub id: String,
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub body: String,
}

/// One search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub date: String,
    pub tags: Vec<String>,
    /// Empty for quick search; a match-centered window for full search.
    pub snippet: String,
    pub score: f32,
}

/// Quick search (type-ahead) returns at most this many hits.
const QUICK_SEARCH_LIMIT: usize = 8;
/// Full-search snippets are roughly this many characters wide.
const SNIPPET_LEN: usize = 120;
/// The match sits this many characters into the snippet window.
const SNIPPET_LEAD: usize = 30;

/// Field boosts for full search: title > tags > body.
const BOOST_TITLE: f32 = 3.0;
const BOOST_TAGS: f32 = 2.0;
const BOOST_BODY: f32 = 1.0;

struct EngineInner {
    _index: Index,
    reader: IndexReader,
    f_id: Field,
    f_title: Field,
    f_date: Field,
    f_tags: Field,
    f_body: Field,
}

/// In-memory search engine over the artifact produced by [`builder`].
pub struct SearchEngine {
    inner: Option<EngineInner>,
}

struct ParsedQuery {
    positive: String,
    tokens: Vec<String>,
    exclusions: Vec<String>,
}

/// Split a raw query into positive terms and `-`-prefixed exclusion terms.
/// A bare `-` is a positive term; exclusions are lowercased substrings, not
/// tokenized into the index query.
fn parse_query(raw: &str) -> ParsedQuery {
    let mut positive_parts = Vec::new();
    let mut exclusions = Vec::new();
    for part in raw.split_whitespace() {
        if let Some(rest) = part.strip_prefix('-') {
            if !rest.is_empty() {
                exclusions.push(rest.to_lowercase());
                continue;
            }
        }
        positive_parts.push(part);
    }
    let positive = positive_parts.join(" ");
    let tokens = tokenize(&positive);
    ParsedQuery {
        positive,
        tokens,
        exclusions,
    }
}

/// Edit distance allowed for one term. Short tokens (including every CJK
/// bigram and single character) must match exactly or fuzziness would make
/// them match almost anything.
fn fuzzy_distance(token: &str) -> u8 {
    if token.chars().count() >= 4 {
        1
    } else {
        0
    }
}

impl SearchEngine {
    /// Load the artifact from disk. Never fails: any fetch or parse problem
    /// is logged and leaves the engine not-ready.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let inner = std::fs::read_to_string(path)
            .map_err(GardenError::from)
            .and_then(|json| Self::try_build(&json));
        match inner {
            Ok(inner) => Self { inner: Some(inner) },
            Err(e) => {
                log::warn!("[SearchEngine] index unavailable ({}): search disabled", e);
                Self { inner: None }
            }
        }
    }

    /// Load from artifact bytes already in hand.
    pub fn load_from_json(json: &str) -> Self {
        match Self::try_build(json) {
            Ok(inner) => Self { inner: Some(inner) },
            Err(e) => {
                log::warn!("[SearchEngine] index unavailable ({}): search disabled", e);
                Self { inner: None }
            }
        }
    }

    fn try_build(json: &str) -> Result<EngineInner, GardenError> {
        let docs: Vec<SearchDoc> = serde_json::from_str(json)?;

        let mut schema_builder = Schema::builder();
        let indexed_text = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer("garden")
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();
        let f_id = schema_builder.add_text_field("id", STRING | STORED);
        let f_title = schema_builder.add_text_field("title", indexed_text.clone());
        let f_date = schema_builder.add_text_field("date", STRING | STORED);
        let f_tags = schema_builder.add_text_field("tags", indexed_text.clone());
        let f_body = schema_builder.add_text_field("body", indexed_text);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        index.tokenizers().register("garden", GardenTokenizer);

        let mut writer = index.writer(15_000_000)?;
        for doc in &docs {
            let mut tdoc = TantivyDocument::new();
            tdoc.add_text(f_id, &doc.id);
            tdoc.add_text(f_title, &doc.title);
            tdoc.add_text(f_date, &doc.date);
            // Tags are one logical joined string; adding each value indexes
            // them into the same field.
            for tag in &doc.tags {
                tdoc.add_text(f_tags, tag);
            }
            tdoc.add_text(f_body, &doc.body);
            writer.add_document(tdoc)?;
        }
        writer.commit()?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        log::info!("[SearchEngine] ready with {} documents", docs.len());
        Ok(EngineInner {
            _index: index,
            reader,
            f_id,
            f_title,
            f_date,
            f_tags,
            f_body,
        })
    }

    /// Whether the artifact loaded successfully. A not-ready engine serves
    /// empty results for every query.
    pub fn is_ready(&self) -> bool {
        self.inner.is_some()
    }

    /// Prefix search over title and tags only, capped to the top 8 hits.
    /// Results carry no snippet.
    pub fn quick_search(&self, raw_query: &str) -> Vec<SearchHit> {
        let Some(inner) = &self.inner else {
            return Vec::new();
        };
        let parsed = parse_query(raw_query);
        if parsed.tokens.is_empty() {
            return Vec::new();
        }
        let fields = [(inner.f_title, 1.0), (inner.f_tags, 1.0)];
        let mut hits = inner.run(&parsed, &fields, false);
        hits.truncate(QUICK_SEARCH_LIMIT);
        hits
    }

    /// Fuzzy prefix search across every field, weighted title > tags > body,
    /// with a generated snippet per hit. Result count is unbounded.
    pub fn full_search(&self, raw_query: &str) -> Vec<SearchHit> {
        let Some(inner) = &self.inner else {
            return Vec::new();
        };
        let parsed = parse_query(raw_query);
        if parsed.tokens.is_empty() {
            return Vec::new();
        }
        let fields = [
            (inner.f_title, BOOST_TITLE),
            (inner.f_tags, BOOST_TAGS),
            (inner.f_body, BOOST_BODY),
        ];
        inner.run(&parsed, &fields, true)
    }
}

impl EngineInner {
    fn build_query(&self, parsed: &ParsedQuery, fields: &[(Field, f32)]) -> Box<dyn Query> {
        let mut per_token: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for token in &parsed.tokens {
            let distance = fuzzy_distance(token);
            let mut per_field: Vec<(Occur, Box<dyn Query>)> = Vec::new();
            for (field, boost) in fields {
                let term = Term::from_field_text(*field, token);
                let fuzzy = FuzzyTermQuery::new_prefix(term, distance, true);
                per_field.push((
                    Occur::Should,
                    Box::new(BoostQuery::new(Box::new(fuzzy), *boost)),
                ));
            }
            per_token.push((Occur::Must, Box::new(BooleanQuery::new(per_field))));
        }
        Box::new(BooleanQuery::new(per_token))
    }

    fn run(&self, parsed: &ParsedQuery, fields: &[(Field, f32)], with_snippets: bool) -> Vec<SearchHit> {
        let searcher = self.reader.searcher();
        let doc_count = searcher.num_docs() as usize;
        if doc_count == 0 {
            return Vec::new();
        }

        let query = self.build_query(parsed, fields);
        let top_docs = match searcher.search(&query, &TopDocs::with_limit(doc_count)) {
            Ok(docs) => docs,
            Err(e) => {
                log::warn!("[SearchEngine] query failed: {}", e);
                return Vec::new();
            }
        };

        let mut hits = Vec::new();
        for (score, doc_address) in top_docs {
            let Ok(doc) = searcher.doc::<TantivyDocument>(doc_address) else {
                continue;
            };
            let text_of = |field: Field| -> String {
                doc.get_first(field)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string()
            };
            let tags: Vec<String> = doc
                .get_all(self.f_tags)
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect();
            let title = text_of(self.f_title);
            let body = text_of(self.f_body);

            // Exclusion terms filter on the whole document text, after the
            // index query and before any truncation.
            if !parsed.exclusions.is_empty() {
                let haystack =
                    format!("{} {} {}", title, tags.join(" "), body).to_lowercase();
                if parsed.exclusions.iter().any(|ex| haystack.contains(ex)) {
                    continue;
                }
            }

            let snippet = if with_snippets {
                make_snippet(&body, &parsed.positive, &parsed.tokens)
            } else {
                String::new()
            };

            hits.push(SearchHit {
                id: text_of(self.f_id),
                title,
                date: text_of(self.f_date),
                tags,
                snippet,
                score,
            });
        }
        hits
    }
}

/// Character index of the first case-insensitive occurrence of `needle`.
fn find_char_index(haystack_lower: &str, needle_lower: &str) -> Option<usize> {
    if needle_lower.is_empty() {
        return None;
    }
    let byte_idx = haystack_lower.find(needle_lower)?;
    Some(haystack_lower[..byte_idx].chars().count())
}

/// A window of ~120 characters around the first match of the positive query,
/// falling back to any bigram token, then to the head of the body. Ellipsis
/// markers are added on clipped ends.
fn make_snippet(body: &str, positive: &str, tokens: &[String]) -> String {
    let body_lower = body.to_lowercase();
    let positive_lower = positive.trim().to_lowercase();

    let match_idx = find_char_index(&body_lower, &positive_lower).or_else(|| {
        tokens
            .iter()
            .filter(|t| t.chars().count() == 2)
            .find_map(|t| find_char_index(&body_lower, t))
    });

    let total = body.chars().count();
    let start = match match_idx {
        Some(idx) => idx.saturating_sub(SNIPPET_LEAD),
        None => 0,
    };
    let window: String = body.chars().skip(start).take(SNIPPET_LEN).collect();

    let mut snippet = String::new();
    if start > 0 {
        snippet.push('…');
    }
    snippet.push_str(window.trim());
    if start + SNIPPET_LEN < total {
        snippet.push('…');
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, tags: &[&str], body: &str) -> SearchDoc {
        SearchDoc {
            id: title.to_string(),
            title: title.to_string(),
            date: "2025-01-01".to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            body: body.to_string(),
        }
    }

    fn engine(docs: &[SearchDoc]) -> SearchEngine {
        SearchEngine::load_from_json(&serde_json::to_string(docs).unwrap())
    }

    #[test]
    fn test_empty_artifact_is_ready_with_empty_results() {
        let e = engine(&[]);
        assert!(e.is_ready());
        assert!(e.quick_search("anything").is_empty());
        assert!(e.full_search("anything").is_empty());
    }

    #[test]
    fn test_broken_artifact_disables_search() {
        let e = SearchEngine::load_from_json("not json at all");
        assert!(!e.is_ready());
        assert!(e.full_search("x").is_empty());
    }

    #[test]
    fn test_missing_artifact_file_disables_search() {
        let e = SearchEngine::load("/nonexistent/search-index.json");
        assert!(!e.is_ready());
    }

    #[test]
    fn test_quick_search_matches_title_prefix_not_body() {
        let e = engine(&[
            doc("Travel Notes", &[], "nothing relevant"),
            doc("Cooking", &[], "travel travel travel"),
        ]);
        let hits = e.quick_search("travel");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Travel Notes");
        assert_eq!(hits[0].snippet, "");
    }

    #[test]
    fn test_quick_search_is_capped_at_eight() {
        let docs: Vec<SearchDoc> = (0..12)
            .map(|i| doc(&format!("travel {}", i), &[], ""))
            .collect();
        let hits = engine(&docs).quick_search("travel");
        assert_eq!(hits.len(), 8);
    }

    #[test]
    fn test_full_search_reaches_bodies_and_makes_snippets() {
        let e = engine(&[doc(
            "Diary",
            &["daily"],
            "a long opening before the keyword appears somewhere in the running text of this note",
        )]);
        let hits = e.full_search("keyword");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].snippet.contains("keyword"));
    }

    #[test]
    fn test_exclusion_terms_drop_matching_docs() {
        let e = engine(&[
            doc("Travel 2019", &["2019"], "travel notes"),
            doc("Travel 2022", &["2022"], "travel notes"),
        ]);
        let hits = e.full_search("travel -2019");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Travel 2022");
    }

    #[test]
    fn test_exclusion_matches_tags_substring() {
        let e = engine(&[
            doc("One", &["2019"], "travel in the body"),
            doc("Two", &[], "travel elsewhere"),
        ]);
        let hits = e.full_search("travel -2019");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Two");
    }

    #[test]
    fn test_bare_hyphen_is_not_an_exclusion() {
        let parsed = parse_query("- travel");
        assert!(parsed.exclusions.is_empty());
        assert_eq!(parsed.tokens, vec!["travel"]);
    }

    #[test]
    fn test_cjk_query_matches_by_bigram() {
        let e = engine(&[
            doc("日記", &[], "今日はいい天気"),
            doc("Other", &[], "nothing here"),
        ]);
        let hits = e.full_search("日記");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "日記");
    }

    #[test]
    fn test_single_cjk_char_query_hits() {
        let e = engine(&[doc("桜の記録", &[], "")]);
        let hits = e.full_search("桜");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_title_outranks_body() {
        let e = engine(&[
            doc("garden", &[], "unrelated"),
            doc("Other", &[], "garden garden garden in the body"),
        ]);
        let hits = e.full_search("garden");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "garden");
    }

    #[test]
    fn test_snippet_windows_and_ellipses() {
        let body = format!("{} target {}", "x".repeat(200), "y".repeat(200));
        let snippet = make_snippet(&body, "target", &[]);
        assert!(snippet.starts_with('…'));
        assert!(snippet.ends_with('…'));
        assert!(snippet.contains("target"));

        let short = make_snippet("tiny body", "absent", &[]);
        assert_eq!(short, "tiny body");
    }
}
