use std::collections::HashSet;

/// Upper bound on the expanded term set. Matchers OR one ILIKE predicate per term
/// per field, so this caps the predicate count per query.
pub const MAX_EXPANDED_TERMS: usize = 8;

/// Static synonym table keyed on whole-word matches against the query. Terms are
/// event-platform vocabulary; broadening recall matters more than precision here
/// because scoring re-ranks whatever the wider net brings back.
const SYNONYMS: &[(&str, &[&str])] = &[
	("concert", &["music", "live", "show", "performance"]),
	("music", &["concert", "live", "band"]),
	("party", &["nightlife", "club", "dance"]),
	("festival", &["fair", "carnival", "celebration"]),
	("food", &["restaurant", "dining", "cuisine"]),
	("drinks", &["bar", "cocktails", "happy hour"]),
	("sports", &["game", "match", "tournament"]),
	("run", &["marathon", "race", "5k"]),
	("art", &["gallery", "exhibition", "museum"]),
	("tech", &["technology", "startup", "hackathon"]),
	("workshop", &["class", "seminar", "training"]),
	("comedy", &["standup", "improv", "open mic"]),
	("market", &["bazaar", "flea", "vendors"]),
	("yoga", &["wellness", "meditation", "fitness"]),
	("theater", &["play", "stage", "drama"]),
	("film", &["movie", "cinema", "screening"]),
];

/// Expands a raw query into an ordered, deduplicated set of lowercase terms: the
/// query itself first, then the synonyms of every whole word that hits the table.
/// Pure function; no synonym hit simply yields `[query]`.
pub fn expand_terms(query: &str) -> Vec<String> {
	let normalized = query.trim().to_lowercase();
	let mut out = Vec::new();
	let mut seen = HashSet::new();

	push_term(&mut out, &mut seen, &normalized);

	for word in tokenize(&normalized) {
		let Some((_, synonyms)) = SYNONYMS.iter().find(|(key, _)| *key == word) else {
			continue;
		};

		for synonym in *synonyms {
			if out.len() >= MAX_EXPANDED_TERMS {
				return out;
			}

			push_term(&mut out, &mut seen, synonym);
		}
	}

	out
}

fn push_term(out: &mut Vec<String>, seen: &mut HashSet<String>, term: &str) {
	let trimmed = term.trim();

	if trimmed.is_empty() {
		return;
	}
	if seen.insert(trimmed.to_string()) {
		out.push(trimmed.to_string());
	}
}

fn tokenize(query: &str) -> Vec<&str> {
	query.split(|ch: char| !ch.is_ascii_alphanumeric()).filter(|word| word.len() >= 2).collect()
}
