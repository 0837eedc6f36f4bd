/// Identifier of a finished comparison on the backend.
pub type ComparisonId = u64;

/// Phases the backend walks through while building a comparison, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    ParsingQuery,
    SearchingGithub,
    AnalyzingRepositories,
    ComparingRepositories,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::ParsingQuery,
        Step::SearchingGithub,
        Step::AnalyzingRepositories,
        Step::ComparingRepositories,
    ];

    /// Parses the backend's snake_case step name. Unknown names yield `None`.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "parsing_query" => Some(Step::ParsingQuery),
            "searching_github" => Some(Step::SearchingGithub),
            "analyzing_repositories" => Some(Step::AnalyzingRepositories),
            "comparing_repositories" => Some(Step::ComparingRepositories),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::ParsingQuery => "Understanding your query",
            Step::SearchingGithub => "Searching GitHub repositories",
            Step::AnalyzingRepositories => "Analyzing repositories",
            Step::ComparingRepositories => "Comparing and ranking results",
        }
    }
}

/// Latest progress report. Events replace it wholesale, never merge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressSnapshot {
    pub step: Option<Step>,
    pub message: Option<String>,
    pub percentage: f64,
    pub current: Option<u32>,
    pub total: Option<u32>,
}

/// Where the finished comparison lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonResult {
    pub comparison_id: ComparisonId,
    pub redirect_url: Option<String>,
}

impl ComparisonResult {
    /// Site-relative path of the comparison page.
    pub fn path(&self) -> String {
        format!("/comparisons/{}", self.comparison_id)
    }
}

/// Transport-agnostic job event. Both the channel and the poller normalize
/// into this shape before anything reaches `update`.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress(ProgressSnapshot),
    Complete {
        result: ComparisonResult,
        message: Option<String>,
    },
    Failed {
        reason: String,
    },
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress(_))
    }
}
