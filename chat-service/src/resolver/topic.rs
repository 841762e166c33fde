//! Topic keywords and the reviewed static answers keyed by them.
//!
//! Matching is plain case-insensitive substring search with no word
//! boundaries: the keyword `ev` also matches inside `every` or `level`.
//! Profiles that need tighter matching should use longer keywords.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("failed to read topic profile: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid topic profile: {0}")]
    Invalid(String),
}

/// Ordered, lower-cased keywords that make a question on-topic.
#[derive(Debug, Clone)]
pub struct TopicKeywordSet {
    keywords: Vec<String>,
}

impl TopicKeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !seen.contains(&keyword) {
                seen.push(keyword);
            }
        }
        Self { keywords: seen }
    }

    /// True iff any keyword occurs anywhere in the question.
    pub fn is_on_topic(&self, question: &str) -> bool {
        self.first_match(question).is_some()
    }

    /// The first keyword, in definition order, found in the question.
    pub fn first_match(&self, question: &str) -> Option<&str> {
        let lowered = question.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lowered.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticAnswer {
    pub keyword: String,
    pub answer: String,
}

/// Keyword → answer entries, checked in definition order.
#[derive(Debug, Clone)]
pub struct StaticAnswerTable {
    entries: Vec<StaticAnswer>,
}

impl StaticAnswerTable {
    pub fn new(entries: Vec<StaticAnswer>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| StaticAnswer {
                keyword: e.keyword.trim().to_lowercase(),
                answer: e.answer.trim().to_string(),
            })
            .collect();
        Self { entries }
    }

    /// Answer of the first entry whose keyword is a substring of the
    /// question. Later matching entries are never consulted.
    pub fn lookup(&self, question: &str) -> Option<&str> {
        let lowered = question.to_lowercase();
        self.entries
            .iter()
            .find(|e| lowered.contains(e.keyword.as_str()))
            .map(|e| e.answer.as_str())
    }

    pub fn entries(&self) -> &[StaticAnswer] {
        &self.entries
    }
}

/// Everything that makes the resolver about one topic.
#[derive(Debug, Clone)]
pub struct TopicProfile {
    pub topic: String,
    pub restriction: String,
    pub refusal: String,
    pub default_answer: String,
    pub keywords: TopicKeywordSet,
    pub answers: StaticAnswerTable,
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    topic: String,
    restriction: String,
    refusal: String,
    default_answer: String,
    keywords: Vec<String>,
    #[serde(default)]
    answers: Vec<StaticAnswer>,
}

impl TopicProfile {
    /// Load a profile from a TOML, YAML or JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ProfileError> {
        let file: ProfileFile = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;

        let profile = TopicProfile {
            topic: file.topic,
            restriction: file.restriction,
            refusal: file.refusal,
            default_answer: file.default_answer,
            keywords: TopicKeywordSet::new(file.keywords),
            answers: StaticAnswerTable::new(file.answers),
        };
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<(), ProfileError> {
        if self.keywords.is_empty() {
            return Err(ProfileError::Invalid("no topic keywords".to_string()));
        }
        if self.refusal.trim().is_empty() || self.default_answer.trim().is_empty() {
            return Err(ProfileError::Invalid(
                "refusal and default_answer must be non-empty".to_string(),
            ));
        }
        for entry in self.answers.entries() {
            if entry.answer.is_empty() {
                return Err(ProfileError::Invalid(format!(
                    "static answer for '{}' is empty",
                    entry.keyword
                )));
            }
            // A question can only reach the table after passing the topic
            // filter, so a key outside the keyword set would be dead.
            if !self.keywords.contains(&entry.keyword) {
                return Err(ProfileError::Invalid(format!(
                    "static answer key '{}' is not a topic keyword",
                    entry.keyword
                )));
            }
        }
        Ok(())
    }

    /// Built-in sustainability profile.
    pub fn sustainability() -> Self {
        let answers = vec![
            ("solar", "Solar energy converts sunlight into electricity using photovoltaic panels or into heat using solar thermal collectors. It is renewable, produces no emissions while operating, and rooftop systems let households generate their own power."),
            ("wind", "Wind energy uses turbines to turn moving air into electricity. Onshore and offshore wind farms are among the cheapest sources of new power and emit no greenhouse gases during operation."),
            ("climate", "Climate change is the long-term warming of the planet driven mainly by greenhouse gases from burning fossil fuels. Cutting emissions, protecting forests and adapting infrastructure are the main responses."),
            ("carbon footprint", "A carbon footprint is the total greenhouse gas emissions caused by a person, product or organization. Travel, home energy use and diet are usually the largest personal contributors."),
            ("recycl", "Recycling turns used materials such as paper, glass, metal and some plastics into new products. Clean, sorted materials and local collection rules make recycling far more effective."),
            ("compost", "Composting lets food scraps and garden waste break down into nutrient-rich soil. It keeps organic waste out of landfills, where it would release methane."),
            ("electric vehicle", "Electric vehicles run on batteries instead of petrol or diesel. They have no tailpipe emissions, and their lifetime footprint shrinks further when charged from renewable electricity."),
            ("ev", "Electric vehicles run on batteries instead of petrol or diesel. They have no tailpipe emissions, and their lifetime footprint shrinks further when charged from renewable electricity."),
            ("plastic", "Plastic pollution harms oceans and wildlife because most plastic never fully breaks down. Reusable bags, bottles and containers are the simplest ways to use less of it."),
            ("water", "Saving water means fixing leaks, choosing efficient fixtures and watering gardens early or late in the day. Less water use also saves the energy spent treating and pumping it."),
        ];

        let keywords = [
            "solar",
            "wind",
            "climate",
            "carbon footprint",
            "carbon",
            "recycl",
            "compost",
            "electric vehicle",
            "ev",
            "plastic",
            "water",
            "renewable",
            "sustainab",
            "emission",
            "greenhouse",
            "environment",
            "energy",
            "pollution",
            "biodiversity",
            "deforestation",
            "green",
            "waste",
        ];

        TopicProfile {
            topic: "sustainability".to_string(),
            restriction: "sustainability_only".to_string(),
            refusal: "I can only answer questions about sustainability and environmental topics. Try asking about renewable energy, recycling, or climate change.".to_string(),
            default_answer: "Sustainability means meeting today's needs without compromising future generations. Reducing energy use, cutting waste and choosing renewable sources are good places to start.".to_string(),
            keywords: TopicKeywordSet::new(keywords),
            answers: StaticAnswerTable::new(
                answers
                    .into_iter()
                    .map(|(keyword, answer)| StaticAnswer {
                        keyword: keyword.to_string(),
                        answer: answer.to_string(),
                    })
                    .collect(),
            ),
        }
    }
}

impl Default for TopicProfile {
    fn default() -> Self {
        Self::sustainability()
    }
}
