//! Character trie over stemmed tokens.
//!
//! Terminal nodes carry the set of document ids containing the exact token.
//! Prefix search walks the subtree and reports, per document, which full
//! tokens produced the hit.

use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    docs: BTreeSet<u32>,
}

#[derive(Debug, Default)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    pub fn new() -> Self {
        Trie::default()
    }

    /// Insert a (token, doc id) pair. Inserting the same pair twice is a
    /// no-op with respect to search results.
    pub fn insert(&mut self, token: &str, doc_id: u32) {
        let mut node = &mut self.root;
        for c in token.chars() {
            node = node.children.entry(c).or_default();
        }
        node.docs.insert(doc_id);
    }

    /// Look up `token`. With `prefix`, every token in the subtree counts;
    /// the returned sets record which full tokens led to each document.
    pub fn search(&self, token: &str, prefix: bool) -> HashMap<u32, BTreeSet<String>> {
        let mut results: HashMap<u32, BTreeSet<String>> = HashMap::new();

        let mut node = &self.root;
        for c in token.chars() {
            match node.children.get(&c) {
                Some(child) => node = child,
                None => return results,
            }
        }

        for &doc_id in &node.docs {
            results.entry(doc_id).or_default().insert(token.to_string());
        }

        if prefix {
            let mut stack: Vec<(&TrieNode, String)> = node
                .children
                .iter()
                .map(|(&c, child)| (child, format!("{}{}", token, c)))
                .collect();
            while let Some((descendant, full)) = stack.pop() {
                for &doc_id in &descendant.docs {
                    results.entry(doc_id).or_default().insert(full.clone());
                }
                for (&c, child) in &descendant.children {
                    stack.push((child, format!("{}{}", full, c)));
                }
            }
        }

        results
    }
}
