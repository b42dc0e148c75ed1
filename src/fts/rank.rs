//! Relevance and authority ranking.
//!
//! Candidates come from prefix trie lookups over the correlated query
//! terms. Each candidate accumulates a Dirichlet+ smoothed language-model
//! score per matched term and field, survives the phrase adjacency filter,
//! and is then either sorted by relevance alone or re-scored through HITS
//! over the link graph.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::index::FtsIndex;
use super::query::Query;

/// Dirichlet smoothing parameter.
const MU: f64 = 2000.0;
/// Lower-bound shift of the Dirichlet+ variant.
const DELTA: f64 = 0.05;
/// Result list cap.
pub const MAX_MATCHES: usize = 150;
/// HITS iteration cap and convergence threshold on the L2 norms.
const MAX_HITS_ITERATIONS: usize = 200;
const HITS_CONVERGENCE: f64 = 1e-5;

/// Transient per-query scoring record.
#[derive(Debug, Clone)]
pub struct Match {
    pub doc_id: u32,
    pub relevancy_score: f64,
    pub terms: BTreeSet<String>,
    pub authority_score: f64,
    pub hub_score: f64,
    pub incoming_neighbors: Vec<u32>,
    pub outgoing_neighbors: Vec<u32>,
    pub score: f64,
}

impl Match {
    fn new(doc_id: u32) -> Match {
        Match {
            doc_id,
            relevancy_score: 0.0,
            terms: BTreeSet::new(),
            authority_score: 1.0,
            hub_score: 1.0,
            incoming_neighbors: Vec::new(),
            outgoing_neighbors: Vec::new(),
            score: 0.0,
        }
    }
}

/// Does a sequence of per-component position lists contain one position per
/// component such that each is exactly one greater than the previous?
pub fn phrase_run(positions: &[Vec<u64>]) -> bool {
    let Some(first) = positions.first() else {
        return true;
    };
    let rest: Vec<HashSet<u64>> = positions[1..]
        .iter()
        .map(|list| list.iter().copied().collect())
        .collect();
    first.iter().any(|&start| {
        rest.iter()
            .enumerate()
            .all(|(i, set)| set.contains(&(start + i as u64 + 1)))
    })
}

impl FtsIndex {
    /// Run the full ranking procedure for a parsed query.
    pub fn search(&self, query: &Query, use_hits: bool) -> Vec<Match> {
        let weighted_terms = self.collect_correlations(&query.terms);
        let weights: HashMap<&str, f64> = weighted_terms
            .iter()
            .map(|(term, weight)| (term.as_str(), *weight))
            .collect();
        let query_len = query.terms.len() as f64;

        let mut candidates: Vec<Match> = Vec::new();
        let mut slot_of: HashMap<u32, usize> = HashMap::new();

        for (term, _) in &weighted_terms {
            let mut hits: Vec<(u32, BTreeSet<String>)> =
                self.trie.search(term, true).into_iter().collect();
            hits.sort_by_key(|(doc_id, _)| *doc_id);

            for (doc_id, actual_terms) in hits {
                if !self.admits(&query.filter, doc_id) {
                    continue;
                }
                let slot = *slot_of.entry(doc_id).or_insert_with(|| {
                    candidates.push(Match::new(doc_id));
                    candidates.len() - 1
                });
                for actual in actual_terms {
                    // Exact and synonym hits carry their correlation
                    // weight; prefix-extended tokens score at 0.1.
                    let tfq = weights.get(actual.as_str()).copied().unwrap_or(0.1);
                    candidates[slot].relevancy_score +=
                        self.term_relevancy(&actual, doc_id, tfq, query_len);
                    candidates[slot].terms.insert(actual);
                }
            }
        }

        if !query.stemmed_phrases.is_empty() {
            candidates.retain(|m| self.check_phrases(m.doc_id, &query.stemmed_phrases));
        }

        if use_hits {
            self.rank_with_hits(candidates)
        } else {
            for m in &mut candidates {
                m.score = m.relevancy_score;
            }
            sort_and_truncate(candidates)
        }
    }

    /// Dirichlet+ contribution of one matched term for one document,
    /// summed over the fields the document appears in.
    fn term_relevancy(&self, term: &str, doc_id: u32, tfq: f64, query_len: f64) -> f64 {
        let Some(entry) = self.terms.get(term) else {
            return 0.0;
        };
        let doc_weight = self
            .document_weights
            .get(doc_id as usize)
            .copied()
            .unwrap_or(1.0);

        let mut score = 0.0;
        for field in &self.fields {
            let Some(doc_entry) = field.documents.get(&doc_id) else {
                continue;
            };
            let appearances = entry.times_appeared.get(&field.name).copied().unwrap_or(0);
            let probability = appearances as f64 / field.total_tokens_seen.max(500) as f64;
            if probability == 0.0 {
                continue;
            }
            let tfd = doc_entry.term_frequencies.get(term).copied().unwrap_or(0) as f64;
            let doc_len = doc_entry.len as f64;

            let term_part = tfq
                * ((1.0 + tfd / (MU * probability)).log2()
                    + (1.0 + DELTA / (MU * probability)).log2());
            let length_part = query_len * (MU / (doc_len + MU)).log2();

            score += (term_part + length_part)
                * field.weight
                * field.length_weight()
                * doc_weight;
        }
        score
    }

    /// Every stemmed phrase must form a consecutive position run in the
    /// document. Positions are drawn from all fields; the separator bump
    /// keeps cross-field runs from qualifying.
    pub fn check_phrases(&self, doc_id: u32, phrases: &[Vec<String>]) -> bool {
        phrases.iter().all(|phrase| {
            let mut positions = Vec::with_capacity(phrase.len());
            for component in phrase {
                match self
                    .terms
                    .get(component)
                    .and_then(|entry| entry.positions.get(&doc_id))
                {
                    Some(list) => positions.push(list.clone()),
                    None => return false,
                }
            }
            phrase_run(&positions)
        })
    }

    /// HITS over the base set: the candidates plus every indexed document
    /// linking to or linked from them.
    fn rank_with_hits(&self, mut matches: Vec<Match>) -> Vec<Match> {
        let mut slot_of: HashMap<u32, usize> = matches
            .iter()
            .enumerate()
            .map(|(slot, m)| (m.doc_id, slot))
            .collect();

        let root_count = matches.len();
        for slot in 0..root_count {
            let url = &self.documents[matches[slot].doc_id as usize].url;
            let neighbors = self
                .incoming
                .get(url)
                .into_iter()
                .flatten()
                .chain(self.outgoing.get(url).into_iter().flatten());
            for neighbor_url in neighbors {
                if let Some(&neighbor_id) = self.url_to_id.get(neighbor_url) {
                    slot_of.entry(neighbor_id).or_insert_with(|| {
                        matches.push(Match::new(neighbor_id));
                        matches.len() - 1
                    });
                }
            }
        }

        let n = matches.len();
        if n == 0 {
            return matches;
        }

        // Adjacency restricted to the base set.
        let mut in_edges: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut out_edges: Vec<Vec<usize>> = vec![Vec::new(); n];
        for slot in 0..n {
            let doc_id = matches[slot].doc_id;
            let url = &self.documents[doc_id as usize].url;
            let mut incoming = Vec::new();
            for source_url in self.incoming.get(url).into_iter().flatten() {
                if let Some(&id) = self.url_to_id.get(source_url) {
                    if let Some(&source_slot) = slot_of.get(&id) {
                        in_edges[slot].push(source_slot);
                        incoming.push(id);
                    }
                }
            }
            let mut outgoing = Vec::new();
            for target_url in self.outgoing.get(url).into_iter().flatten() {
                if let Some(&id) = self.url_to_id.get(target_url) {
                    if let Some(&target_slot) = slot_of.get(&id) {
                        out_edges[slot].push(target_slot);
                        outgoing.push(id);
                    }
                }
            }
            matches[slot].incoming_neighbors = incoming;
            matches[slot].outgoing_neighbors = outgoing;
        }

        let mut authority = vec![1.0f64; n];
        let mut hub = vec![1.0f64; n];
        let mut previous_authority_norm = 0.0;
        let mut previous_hub_norm = 0.0;

        for _ in 0..MAX_HITS_ITERATIONS {
            let mut next_authority: Vec<f64> = (0..n)
                .map(|v| in_edges[v].iter().map(|&u| hub[u]).sum())
                .collect();
            let authority_norm = l2_norm(&next_authority);
            if authority_norm > 0.0 {
                for value in &mut next_authority {
                    *value /= authority_norm;
                }
            }

            let mut next_hub: Vec<f64> = (0..n)
                .map(|v| out_edges[v].iter().map(|&w| next_authority[w]).sum())
                .collect();
            let hub_norm = l2_norm(&next_hub);
            if hub_norm > 0.0 {
                for value in &mut next_hub {
                    *value /= hub_norm;
                }
            }

            authority = next_authority;
            hub = next_hub;

            if (authority_norm - previous_authority_norm).abs() < HITS_CONVERGENCE
                && (hub_norm - previous_hub_norm).abs() < HITS_CONVERGENCE
            {
                break;
            }
            previous_authority_norm = authority_norm;
            previous_hub_norm = hub_norm;
        }

        for (slot, m) in matches.iter_mut().enumerate() {
            m.authority_score = if authority[slot].is_nan() {
                1e-10
            } else {
                authority[slot]
            };
            m.hub_score = hub[slot];
        }

        // Placeholders only feed the link analysis.
        matches.retain(|m| m.relevancy_score > 0.0);
        if matches.is_empty() {
            return matches;
        }

        let count = matches.len() as f64;
        let mean = matches.iter().map(|m| m.relevancy_score).sum::<f64>() / count;
        let variance = matches
            .iter()
            .map(|m| (m.relevancy_score - mean).powi(2))
            .sum::<f64>()
            / count;
        let threshold = variance.sqrt();

        let mut max_relevancy = matches
            .iter()
            .filter(|m| m.relevancy_score >= threshold)
            .map(|m| m.relevancy_score)
            .fold(f64::NEG_INFINITY, f64::max);
        if !max_relevancy.is_finite() || max_relevancy <= 0.0 {
            max_relevancy = matches
                .iter()
                .map(|m| m.relevancy_score)
                .fold(1e-10, f64::max);
        }
        let mut max_authority = matches
            .iter()
            .filter(|m| m.relevancy_score >= threshold)
            .map(|m| m.authority_score)
            .fold(f64::NEG_INFINITY, f64::max);
        if !max_authority.is_finite() || max_authority <= 0.0 {
            max_authority = 1e-10;
        }

        for m in &mut matches {
            m.score = (m.relevancy_score / max_relevancy + 1.0).log2()
                + (m.authority_score / max_authority + 1.0).log2() * (1.0 / 4f64.log2());
            if m.relevancy_score < threshold * 2.5 {
                m.score -= threshold / m.relevancy_score;
            }
        }

        sort_and_truncate(matches)
    }
}

fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Stable sort keeps first-generated matches ahead on equal scores.
fn sort_and_truncate(mut matches: Vec<Match>) -> Vec<Match> {
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    matches.truncate(MAX_MATCHES);
    matches
}
