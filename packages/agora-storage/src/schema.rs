pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_events.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_events.sql")),
				"tables/002_users.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_users.sql")),
				"tables/003_organizations.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_organizations.sql")),
				"tables/004_posts.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_posts.sql")),
				"tables/005_event_checkins.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_event_checkins.sql")),
				"tables/006_search_analytics.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_search_analytics.sql")),
				other => panic!("Unknown schema include: {other}"),
			}
			out.push('\n');
		} else {
			out.push_str(line);
			out.push('\n');
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn renders_all_tables() {
		let sql = render_schema();

		for table in [
			"events",
			"users",
			"organizations",
			"posts",
			"event_checkins",
			"search_analytics",
		] {
			assert!(
				sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
				"missing table {table}"
			);
		}
		assert!(!sql.contains("\\ir"));
	}
}
