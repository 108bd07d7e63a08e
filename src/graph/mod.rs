//! The garden link graph and its query surface.
//!
//! One whole-corpus scan extracts every link edge; the three graph queries
//! are recomputed from that flat edge list per call, which is O(edges) and
//! comfortably cheap at personal-corpus scale. There is no persistent graph
//! structure. A failed corpus fetch propagates: an empty graph produced by a
//! failed scan must never masquerade as a genuinely empty corpus.

pub mod links;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::GardenError;
use crate::frontmatter::{self, NoteMeta};
use crate::render::{make_excerpt, render_markdown};
use crate::slug::title_to_slug;
use crate::store::{NoteStore, RawNote, RenderCycleCache};
use links::scan_links;

/// A garden entry backed by a real note file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenNode {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub tags: Vec<String>,
    pub content_html: String,
    pub excerpt: String,
    pub mtime: String,
}

/// One extracted link occurrence. Edges are not deduplicated at extraction
/// time; each query deduplicates as it needs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEdge {
    pub source_slug: String,
    pub source_title: String,
    pub target_slug: String,
    pub target_title: String,
}

/// View over a linked page: a real note when one exists for the slug, or a
/// bare title for a virtual page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedPageSummary {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Pages that share a forward-link target ("via") with the current node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoHopGroup {
    pub via: String,
    pub via_slug: String,
    pub pages: Vec<LinkedPageSummary>,
}

/// Flat edge list over one corpus snapshot.
pub struct LinkGraph {
    edges: Vec<LinkEdge>,
}

impl LinkGraph {
    /// Scan every note body once, extracting all edges in source order.
    /// `notes` holds `(slug, title, raw body)` triples. Edges whose target
    /// title slugs to nothing (pure punctuation) carry no addressable
    /// identity and are dropped.
    pub fn build(notes: &[(String, String, String)]) -> Self {
        let mut edges = Vec::new();
        for (source_slug, source_title, body) in notes {
            for link in scan_links(body) {
                let target_slug = title_to_slug(&link.target);
                if target_slug.is_empty() {
                    continue;
                }
                edges.push(LinkEdge {
                    source_slug: source_slug.clone(),
                    source_title: source_title.clone(),
                    target_slug,
                    target_title: link.target,
                });
            }
        }
        log::debug!("[LinkGraph] extracted {} edges from {} notes", edges.len(), notes.len());
        Self { edges }
    }

    pub fn edges(&self) -> &[LinkEdge] {
        &self.edges
    }

    /// Pages related to `slug`: first the sources that point at any target
    /// `slug` also points at (shared-forward-link peers), then the direct
    /// backlinks. Deduplicated by source slug in first-encountered order;
    /// `slug` itself is never included.
    pub fn linked_pages(&self, slug: &str) -> Vec<(String, String)> {
        let my_targets: HashSet<&str> = self
            .edges
            .iter()
            .filter(|e| e.source_slug == slug)
            .map(|e| e.target_slug.as_str())
            .collect();

        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(slug);
        let mut out = Vec::new();

        for edge in &self.edges {
            if my_targets.contains(edge.target_slug.as_str())
                && seen.insert(edge.source_slug.as_str())
            {
                out.push((edge.source_slug.clone(), edge.source_title.clone()));
            }
        }
        for edge in &self.edges {
            if edge.target_slug == slug && seen.insert(edge.source_slug.as_str()) {
                out.push((edge.source_slug.clone(), edge.source_title.clone()));
            }
        }
        out
    }

    /// Group pages two hops out by their intermediate "via" target. The via
    /// candidates are targets of `slug`'s linked pages that are neither
    /// `slug` nor one of those linked pages; group members are the other
    /// sources linking to the via, with `slug` and its direct neighborhood
    /// excluded. Empty groups are dropped.
    pub fn two_hop_links(&self, slug: &str) -> Vec<(String, String, Vec<(String, String)>)> {
        let linked = self.linked_pages(slug);
        let linked_set: HashSet<&str> = linked.iter().map(|(s, _)| s.as_str()).collect();

        let mut via_order: Vec<(&str, &str)> = Vec::new();
        let mut via_seen: HashSet<&str> = HashSet::new();
        for edge in &self.edges {
            if linked_set.contains(edge.source_slug.as_str())
                && edge.target_slug != slug
                && !linked_set.contains(edge.target_slug.as_str())
                && via_seen.insert(edge.target_slug.as_str())
            {
                via_order.push((edge.target_slug.as_str(), edge.target_title.as_str()));
            }
        }

        let mut groups = Vec::new();
        for (via_slug, via_title) in via_order {
            let mut member_seen: HashSet<&str> = HashSet::new();
            let mut members = Vec::new();
            for edge in &self.edges {
                if edge.target_slug == via_slug
                    && edge.source_slug != slug
                    && !linked_set.contains(edge.source_slug.as_str())
                    && member_seen.insert(edge.source_slug.as_str())
                {
                    members.push((edge.source_slug.clone(), edge.source_title.clone()));
                }
            }
            if !members.is_empty() {
                groups.push((via_slug.to_string(), via_title.to_string(), members));
            }
        }
        groups
    }

    /// Every distinct target slug mapped to its first-seen title. Later
    /// duplicates never overwrite; the first edge observed names the page.
    pub fn all_linked_slugs(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for edge in &self.edges {
            map.entry(edge.target_slug.clone())
                .or_insert_with(|| edge.target_title.clone());
        }
        map
    }
}

/// One note after metadata resolution, before HTML rendering.
struct LoadedNote {
    slug: String,
    meta: NoteMeta,
    mtime: String,
}

/// The garden query surface for one render cycle.
///
/// Holds no state of its own: the corpus fetch is memoized by the
/// [`RenderCycleCache`] handed in, so any number of queries within one cycle
/// observe exactly one underlying fetch.
pub struct Garden<'a> {
    store: &'a dyn NoteStore,
    cache: &'a RenderCycleCache,
}

impl<'a> Garden<'a> {
    pub fn new(store: &'a dyn NoteStore, cache: &'a RenderCycleCache) -> Self {
        Self { store, cache }
    }

    fn loaded_notes(&self) -> Result<Vec<LoadedNote>, GardenError> {
        let notes = self.cache.notes(self.store)?;
        Ok(notes.iter().map(load_note).collect())
    }

    fn graph_of(notes: &[LoadedNote]) -> LinkGraph {
        let scan_input: Vec<(String, String, String)> = notes
            .iter()
            .map(|n| (n.slug.clone(), n.meta.title.clone(), n.meta.body.clone()))
            .collect();
        LinkGraph::build(&scan_input)
    }

    /// All real nodes, rendered, sorted by date descending with modification
    /// recency as the tiebreaker.
    pub fn get_all_nodes(&self) -> Result<Vec<GardenNode>, GardenError> {
        let notes = self.loaded_notes()?;
        let known: HashSet<String> = notes.iter().map(|n| n.slug.clone()).collect();

        let mut nodes: Vec<GardenNode> = notes
            .iter()
            .map(|n| render_node(n, &known))
            .collect();
        nodes.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.mtime.cmp(&a.mtime)));
        Ok(nodes)
    }

    pub fn get_node_by_slug(&self, slug: &str) -> Result<Option<GardenNode>, GardenError> {
        let notes = self.loaded_notes()?;
        let known: HashSet<String> = notes.iter().map(|n| n.slug.clone()).collect();
        Ok(notes
            .iter()
            .find(|n| n.slug == slug)
            .map(|n| render_node(n, &known)))
    }

    pub fn get_linked_pages(&self, slug: &str) -> Result<Vec<LinkedPageSummary>, GardenError> {
        let notes = self.loaded_notes()?;
        let graph = Self::graph_of(&notes);
        Ok(graph
            .linked_pages(slug)
            .into_iter()
            .map(|(page_slug, title)| summarize(&notes, &page_slug, &title))
            .collect())
    }

    pub fn get_two_hop_links(&self, slug: &str) -> Result<Vec<TwoHopGroup>, GardenError> {
        let notes = self.loaded_notes()?;
        let graph = Self::graph_of(&notes);
        Ok(graph
            .two_hop_links(slug)
            .into_iter()
            .map(|(via_slug, via_title, members)| {
                // Prefer the real node's title when the via page exists.
                let via = notes
                    .iter()
                    .find(|n| n.slug == via_slug)
                    .map(|n| n.meta.title.clone())
                    .unwrap_or(via_title);
                TwoHopGroup {
                    via,
                    via_slug,
                    pages: members
                        .into_iter()
                        .map(|(page_slug, title)| summarize(&notes, &page_slug, &title))
                        .collect(),
                }
            })
            .collect())
    }

    /// Every addressable slug: real nodes plus virtual link targets, for
    /// static path enumeration. Real slugs come first.
    pub fn get_all_page_slugs(&self) -> Result<Vec<String>, GardenError> {
        let notes = self.loaded_notes()?;
        let graph = Self::graph_of(&notes);

        let mut seen: HashSet<String> = HashSet::new();
        let mut slugs = Vec::new();
        for note in &notes {
            if seen.insert(note.slug.clone()) {
                slugs.push(note.slug.clone());
            }
        }
        let mut virtual_slugs: Vec<String> = graph
            .all_linked_slugs()
            .into_keys()
            .filter(|s| !seen.contains(s))
            .collect();
        virtual_slugs.sort();
        slugs.extend(virtual_slugs);
        Ok(slugs)
    }

    /// First-seen titles for every link target, real or virtual.
    pub fn get_all_linked_slugs(&self) -> Result<HashMap<String, String>, GardenError> {
        let notes = self.loaded_notes()?;
        Ok(Self::graph_of(&notes).all_linked_slugs())
    }
}

fn load_note(raw: &RawNote) -> LoadedNote {
    let meta = frontmatter::normalize(&raw.filename, &raw.content, &raw.modified_at);
    LoadedNote {
        slug: title_to_slug(&meta.title),
        mtime: raw.modified_at.to_rfc3339(),
        meta,
    }
}

fn render_node(note: &LoadedNote, known: &HashSet<String>) -> GardenNode {
    GardenNode {
        slug: note.slug.clone(),
        title: note.meta.title.clone(),
        date: note.meta.date.clone(),
        tags: note.meta.tags.clone(),
        content_html: render_markdown(&note.meta.body, known),
        excerpt: make_excerpt(&note.meta.body),
        mtime: note.mtime.clone(),
    }
}

/// A real node yields its excerpt and date; a virtual page is a bare title.
fn summarize(notes: &[LoadedNote], slug: &str, fallback_title: &str) -> LinkedPageSummary {
    match notes.iter().find(|n| n.slug == slug) {
        Some(note) => LinkedPageSummary {
            slug: slug.to_string(),
            title: note.meta.title.clone(),
            excerpt: Some(make_excerpt(&note.meta.body)),
            date: Some(note.meta.date.clone()),
        },
        None => LinkedPageSummary {
            slug: slug.to_string(),
            title: fallback_title.to_string(),
            excerpt: None,
            date: None,
        },
    }
}
