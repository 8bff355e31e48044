use std::collections::HashSet;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

pub const MAX_SKILL_CHARS: usize = 64;

const LEADING_MARKER: &str = r"^(?:[-*•·]+|\d{1,2}[.)])\s*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillReject {
	Empty,
	TooLong,
	Duplicate,
	OverLimit,
}
impl SkillReject {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Empty => "EMPTY",
			Self::TooLong => "TOO_LONG",
			Self::Duplicate => "DUPLICATE",
			Self::OverLimit => "OVER_LIMIT",
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillList {
	/// Accepted phrases in input order.
	pub skills: Vec<String>,
	pub rejected: Vec<(String, SkillReject)>,
}

/// Cleans one capability phrase: NFKC, list markers and wrapping quotes removed, whitespace
/// collapsed, trailing sentence punctuation dropped. Symbols that carry meaning in technology
/// names (`C++`, `C#`, `.NET`, `React.js`) survive.
pub fn normalize_skill(raw: &str) -> Result<String, SkillReject> {
	let nfkc: String = raw.nfkc().collect();
	let collapsed = nfkc.split_whitespace().collect::<Vec<_>>().join(" ");
	let unmarked = Regex::new(LEADING_MARKER)
		.map(|re| re.replace(&collapsed, "").into_owned())
		.unwrap_or(collapsed);
	let out = unmarked
		.trim_start_matches(is_quote)
		.trim_end_matches(|c: char| is_quote(c) || matches!(c, '.' | ',' | ';' | ':' | '!'))
		.trim();

	if out.is_empty() || !out.chars().any(char::is_alphanumeric) {
		return Err(SkillReject::Empty);
	}
	if out.chars().count() > MAX_SKILL_CHARS {
		return Err(SkillReject::TooLong);
	}

	Ok(out.to_string())
}

fn is_quote(c: char) -> bool {
	matches!(c, '"' | '\'' | '`' | '“' | '”')
}

/// Identity used for dedup and storage uniqueness.
pub fn skill_key(skill: &str) -> String {
	skill.to_lowercase()
}

/// Normalizes and deduplicates phrases while preserving first-seen order, keeping at most `max`.
pub fn normalize_skill_list<I, S>(raw: I, max: usize) -> SkillList
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut seen = HashSet::new();
	let mut out = SkillList::default();

	for item in raw {
		let item = item.as_ref();
		let skill = match normalize_skill(item) {
			Ok(skill) => skill,
			Err(reject) => {
				out.rejected.push((item.to_string(), reject));

				continue;
			},
		};

		if !seen.insert(skill_key(&skill)) {
			out.rejected.push((skill, SkillReject::Duplicate));

			continue;
		}
		if out.skills.len() >= max {
			out.rejected.push((skill, SkillReject::OverLimit));

			continue;
		}

		out.skills.push(skill);
	}

	out
}
