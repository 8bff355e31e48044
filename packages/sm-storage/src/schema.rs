pub fn render_schema(vector_dim: u32) -> String {
	let init = include_str!("../../../sql/init.sql");
	let expanded = expand_includes(init);

	expanded.replace("<VECTOR_DIM>", &vector_dim.to_string())
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_people.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_people.sql")),
				"tables/002_skills.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_skills.sql")),
				"tables/003_person_skills.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_person_skills.sql")),
				"tables/004_needs.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_needs.sql")),
				"tables/005_channels.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_channels.sql")),
				"tables/006_channel_members.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_channel_members.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
