use std::collections::HashSet;

use agora_storage::models::{EventRow, OrganizationRow, PostRow, UserRow};

/// Completion candidates mined from the rows already fetched for this search.
/// A candidate qualifies when it contains the query and extends it; the query
/// itself is never suggested back.
pub(crate) fn suggestions(
	raw: &str,
	events: &[EventRow],
	organizations: &[OrganizationRow],
	users: &[UserRow],
	posts: &[PostRow],
	limit: usize,
) -> Vec<String> {
	let needle = raw.to_lowercase();
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	{
		let mut push = |candidate: &str| {
			if out.len() >= limit {
				return;
			}

			let trimmed = candidate.trim();
			let lowered = trimmed.to_lowercase();

			if lowered.contains(&needle) && lowered.len() > needle.len() && seen.insert(lowered) {
				out.push(trimmed.to_string());
			}
		};

		for event in events {
			push(&event.title);

			if let Some(category) = &event.category {
				push(category);
			}
		}
		for organization in organizations {
			push(&organization.name);
		}
		for user in users {
			push(&user.username);

			if let Some(display_name) = &user.display_name {
				push(display_name);
			}
		}
		for post in posts {
			if let Some(title) = &post.title {
				push(title);
			}
		}
	}

	out
}

/// Alternative queries surfaced from the synonym expansion, minus the query the
/// caller already typed.
pub(crate) fn related_searches(raw: &str, terms: &[String], limit: usize) -> Vec<String> {
	let needle = raw.trim().to_lowercase();

	terms.iter().filter(|term| **term != needle).take(limit).cloned().collect()
}
