//! Top-K selection over a frequency table.
//!
//! Ranking is descending count, ties broken by ascending byte-wise word order,
//! so the output for a given table and `k` is always the same.

use super::counter::FrequencyTable;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Ordered (word, count) pairs, best ranked first, at most K long
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopKResult {
    entries: Vec<WordCount>,
}

impl TopKResult {
    pub fn entries(&self) -> &[WordCount] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn words(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.word.clone()).collect()
    }

    pub fn frequencies(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.count).collect()
    }
}

impl FromIterator<WordCount> for TopKResult {
    fn from_iter<I: IntoIterator<Item = WordCount>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Heap element; "greater" means better ranked.
#[derive(Debug, PartialEq, Eq)]
struct Ranked<'a> {
    count: u64,
    word: &'a str,
}

impl Ord for Ranked<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.word.cmp(self.word))
    }
}

impl PartialOrd for Ranked<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Select the `k` best ranked words. Returns every word when `k` exceeds the
/// number of distinct words.
pub fn top_k(table: &FrequencyTable, k: NonZeroUsize) -> TopKResult {
    let k = k.get();
    // min-heap holding the best k seen so far; the root is the worst of them
    let mut heap: BinaryHeap<Reverse<Ranked<'_>>> =
        BinaryHeap::with_capacity(k.min(table.len()));

    for (word, count) in table.iter() {
        let candidate = Ranked { count, word };
        if heap.len() < k {
            heap.push(Reverse(candidate));
        } else if let Some(mut worst) = heap.peek_mut()
            && candidate > worst.0
        {
            *worst = Reverse(candidate);
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(r)| WordCount {
            word: r.word.to_string(),
            count: r.count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{count, tokenize};

    const SAMPLE: &str =
        "word3 word2 word4 word1 word2 word5 word3 word3 word4 word5 word4 word5 word4 word5 word5";

    fn nz(k: usize) -> NonZeroUsize {
        NonZeroUsize::new(k).unwrap()
    }

    #[test]
    fn test_sample_top_three() {
        let table = count(tokenize(SAMPLE));
        let result = top_k(&table, nz(3));
        assert_eq!(result.words(), vec!["word5", "word4", "word3"]);
        assert_eq!(result.frequencies(), vec![5, 4, 3]);
    }

    #[test]
    fn test_k_larger_than_vocabulary_returns_everything() {
        let table = count(tokenize(SAMPLE));
        let result = top_k(&table, nz(100));
        assert_eq!(result.len(), 5);
        assert_eq!(
            result.words(),
            vec!["word5", "word4", "word3", "word2", "word1"]
        );
        assert_eq!(result.frequencies().iter().sum::<u64>(), table.total());
    }

    #[test]
    fn test_ties_break_lexically() {
        let table = count(["pear", "apple", "fig", "pear", "apple", "fig", "kiwi"]);
        let result = top_k(&table, nz(2));
        assert_eq!(result.words(), vec!["apple", "fig"]);

        let all = top_k(&table, nz(4));
        assert_eq!(all.words(), vec!["apple", "fig", "pear", "kiwi"]);
    }

    #[test]
    fn test_no_excluded_word_outranks_an_included_one() {
        let text = "a b c d e f a b c d e a b c d a b c a b a z z z z z z";
        let table = count(tokenize(text));
        let result = top_k(&table, nz(3));
        assert_eq!(result.len(), 3);
        let min_included = result.frequencies().into_iter().min().unwrap();
        let included = result.words();
        for (word, n) in table.iter() {
            if !included.iter().any(|w| w == word) {
                assert!(n <= min_included, "{word} ({n}) should have been selected");
            }
        }
    }

    #[test]
    fn test_deterministic_across_calls() {
        let table = count(tokenize("x y z x y z q r s t u v w"));
        let first = serde_json::to_vec(&top_k(&table, nz(5))).unwrap();
        for _ in 0..10 {
            assert_eq!(first, serde_json::to_vec(&top_k(&table, nz(5))).unwrap());
        }
    }

    #[test]
    fn test_empty_table() {
        let result = top_k(&FrequencyTable::default(), nz(3));
        assert!(result.is_empty());
    }

    #[test]
    fn test_huge_k_does_not_preallocate() {
        let table = count(["only"]);
        let result = top_k(&table, NonZeroUsize::MAX);
        assert_eq!(result.words(), vec!["only"]);
    }
}
