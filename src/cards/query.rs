//! Dashboard queries over a learner's words

use std::collections::BTreeMap;

use super::models::Word;

/// How many contexts carry each label
pub fn tag_counts(words: &[Word]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for tag in words
        .iter()
        .flat_map(|w| w.units.iter())
        .flat_map(|u| u.content.tags.iter())
    {
        *counts.entry(tag.clone()).or_insert(0) += 1;
    }
    counts
}

/// Words matching a free-text query and/or carrying a label
///
/// The query matches (case-insensitively) the word itself, any of its
/// sentences, or any of its meanings.
pub fn filter_words<'a>(words: &'a [Word], query: Option<&str>, tag: Option<&str>) -> Vec<&'a Word> {
    let query = query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    words
        .iter()
        .filter(|word| match tag {
            Some(tag) => word
                .units
                .iter()
                .any(|u| u.content.tags.iter().any(|t| t == tag)),
            None => true,
        })
        .filter(|word| match &query {
            Some(q) => {
                word.text.to_lowercase().contains(q.as_str())
                    || word.units.iter().any(|u| {
                        u.content.sentence.to_lowercase().contains(q.as_str())
                            || u.content.meaning.to_lowercase().contains(q.as_str())
                    })
            }
            None => true,
        })
        .collect()
}
