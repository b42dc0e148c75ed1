//! Full-Text Search Engine Core
//!
//! Everything between a raw query string and a ranked list of document ids
//! lives here, with no I/O and no async:
//!
//! - **`text`**: tokenizer plus the fixed lexical tables (stop words,
//!   atomic phrases, mandatory terms).
//! - **`stem`**: the English Porter2 stemmer with process-wide memoization.
//! - **`trie`**: character trie used for exact and prefix term lookup.
//! - **`query`**: raw query string -> terms, phrases, stemmed phrases.
//! - **`index`**: the inverted index (`FtsIndex`) with per-field posting
//!   data, token positions, link graph, and synonym correlations.
//! - **`rank`**: Dirichlet+ relevance scoring, the phrase adjacency
//!   filter, and HITS link analysis.
//!
//! Each worker thread owns one `FtsIndex` generation; the pool layer never
//! shares index state between threads.

pub mod index;
pub mod query;
pub mod rank;
pub mod stem;
pub mod text;
pub mod trie;
