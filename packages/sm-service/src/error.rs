pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Request,
	ExtractSkills,
	EmbedNeed,
	EmbedSkills,
	Retrieve,
	LogNeed,
	Rerank,
	Stats,
	AssignSkills,
	/// Raised by a collaborator before the service attributed it to a stage.
	Collaborator,
}
impl Stage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Request => "request",
			Self::ExtractSkills => "extract_skills",
			Self::EmbedNeed => "embed_need",
			Self::EmbedSkills => "embed_skills",
			Self::Retrieve => "retrieve",
			Self::LogNeed => "log_need",
			Self::Rerank => "rerank",
			Self::Stats => "stats",
			Self::AssignSkills => "assign_skills",
			Self::Collaborator => "collaborator",
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Rate limited; retry after {retry_after_secs}s.")]
	RateLimited { retry_after_secs: u64 },
	#[error("Skill extraction failed: {message}")]
	ExtractionFailed { message: String },
	#[error("Embedding failed at {}: {message}", stage.as_str())]
	EmbeddingFailed { stage: Stage, message: String },
	#[error("Retrieval failed for skill {skill:?}: {message}")]
	RetrievalFailed { skill: String, message: String },
	#[error("Rerank failed: {message}")]
	RerankFailed { message: String },
	#[error("Need log failed: {message}")]
	NeedLogFailed { message: String },
	#[error("Stats query failed: {message}")]
	StatsFailed { message: String },
	#[error("Skill assignment failed: {message}")]
	AssignFailed { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub fn stage(&self) -> Stage {
		match self {
			Self::InvalidRequest { .. } | Self::NotFound { .. } | Self::RateLimited { .. } =>
				Stage::Request,
			Self::ExtractionFailed { .. } => Stage::ExtractSkills,
			Self::EmbeddingFailed { stage, .. } => *stage,
			Self::RetrievalFailed { .. } => Stage::Retrieve,
			Self::RerankFailed { .. } => Stage::Rerank,
			Self::NeedLogFailed { .. } => Stage::LogNeed,
			Self::StatsFailed { .. } => Stage::Stats,
			Self::AssignFailed { .. } => Stage::AssignSkills,
			Self::Provider { .. } | Self::Storage { .. } => Stage::Collaborator,
		}
	}

	/// Inner message without the variant prefix.
	pub fn detail(&self) -> String {
		match self {
			Self::InvalidRequest { message }
			| Self::NotFound { message }
			| Self::ExtractionFailed { message }
			| Self::EmbeddingFailed { message, .. }
			| Self::RetrievalFailed { message, .. }
			| Self::RerankFailed { message }
			| Self::NeedLogFailed { message }
			| Self::StatsFailed { message }
			| Self::AssignFailed { message }
			| Self::Provider { message }
			| Self::Storage { message } => message.clone(),
			Self::RateLimited { .. } => self.to_string(),
		}
	}

	pub(crate) fn extraction(err: Self) -> Self {
		match err {
			Self::ExtractionFailed { .. } => err,
			other => Self::ExtractionFailed { message: other.detail() },
		}
	}

	pub(crate) fn embedding(stage: Stage, err: Self) -> Self {
		match err {
			Self::EmbeddingFailed { message, .. } => Self::EmbeddingFailed { stage, message },
			other => Self::EmbeddingFailed { stage, message: other.detail() },
		}
	}

	pub(crate) fn retrieval(skill: &str, err: Self) -> Self {
		Self::RetrievalFailed { skill: skill.to_string(), message: err.detail() }
	}

	pub(crate) fn rerank(err: Self) -> Self {
		match err {
			Self::RerankFailed { .. } => err,
			other => Self::RerankFailed { message: other.detail() },
		}
	}

	pub(crate) fn need_log(err: Self) -> Self {
		match err {
			Self::NeedLogFailed { .. } => err,
			other => Self::NeedLogFailed { message: other.detail() },
		}
	}

	pub(crate) fn stats(err: Self) -> Self {
		Self::StatsFailed { message: err.detail() }
	}

	pub(crate) fn assign(err: Self) -> Self {
		match err {
			Self::AssignFailed { .. } | Self::NotFound { .. } | Self::InvalidRequest { .. } => err,
			other => Self::AssignFailed { message: other.detail() },
		}
	}
}

impl From<sm_storage::Error> for Error {
	fn from(err: sm_storage::Error) -> Self {
		match err {
			sm_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			sm_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}

impl From<sm_providers::Error> for Error {
	fn from(err: sm_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
