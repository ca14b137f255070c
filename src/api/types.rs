use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Actor classification used to segment votes and authorship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    #[default]
    Human,
    Ai,
    Company,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Human, Species::Ai, Species::Company];

    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Human => "human",
            Species::Ai => "ai",
            Species::Company => "company",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Species {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(Species::Human),
            "ai" => Ok(Species::Ai),
            "company" => Ok(Species::Company),
            other => Err(format!("unknown species '{}'", other)),
        }
    }
}

/// Backend fields that arrive either as a decimal string or a bare number.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null => String::new(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub species: Species,
    #[serde(default, deserialize_with = "string_or_number")]
    pub harmony_score: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub creative_spark: String,
    #[serde(default)]
    pub network_centrality: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    /// Profile used when a token is held but the profile endpoint is unreachable.
    pub fn traveler() -> Self {
        Self {
            id: 999,
            username: "Traveler".to_string(),
            email: None,
            species: Species::Human,
            harmony_score: "100".to_string(),
            creative_spark: "5000".to_string(),
            network_centrality: 0.5,
            avatar: None,
        }
    }

    pub fn initials(&self) -> String {
        initials(&self.username)
    }
}

/// First letter of the first two words, or the first two letters of a
/// single word, uppercased.
pub fn initials(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.as_slice() {
        [] => String::new(),
        [single] => single.chars().take(2).collect::<String>().to_uppercase(),
        many => many
            .iter()
            .take(2)
            .filter_map(|part| part.chars().next())
            .collect::<String>()
            .to_uppercase(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub species: Species,
    pub harmony_score: String,
    pub creative_spark: String,
    pub network_centrality: f64,
}

impl RegisterRequest {
    pub fn new(username: &str, password: &str, species: Species) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            email: None,
            species,
            harmony_score: "50".to_string(),
            creative_spark: "50".to_string(),
            network_centrality: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthorRef {
    Id(i64),
    Name(String),
}

impl Default for AuthorRef {
    fn default() -> Self {
        AuthorRef::Id(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VibeNode {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author_id: AuthorRef,
    #[serde(default)]
    pub author_username: String,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub echo: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub negentropy_score: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub fractal_depth: u32,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub comments_count: u64,
}

impl VibeNode {
    /// Builds a feed item from a graph node. The numeric id comes from a
    /// `v_<n>` node id, otherwise from a stable hash of the node id.
    pub fn from_graph_node(node: &NetworkNode) -> Self {
        let id = node
            .id
            .strip_prefix("v_")
            .unwrap_or(&node.id)
            .parse::<i64>()
            .unwrap_or_else(|_| {
                let mut hasher = DefaultHasher::new();
                node.id.hash(&mut hasher);
                (hasher.finish() % 100_000) as i64
            });

        Self {
            id,
            name: node.label.clone(),
            description: "Content derived from Neural Lattice.".to_string(),
            author_id: AuthorRef::Id(0),
            author_username: "Unknown".to_string(),
            media_type: MediaType::Text,
            media_url: None,
            echo: node.echo.unwrap_or(0.0).to_string(),
            negentropy_score: "0".to_string(),
            tags: None,
            created_at: Utc::now().to_rfc3339(),
            fractal_depth: 0,
            likes_count: 0,
            comments_count: 0,
        }
    }

    pub fn echo_value(&self) -> f64 {
        self.echo.trim().parse().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewVibeNode {
    pub name: String,
    pub description: String,
    pub media_type: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Up/down counts for one species.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub up: u64,
    pub down: u64,
}

impl Tally {
    pub fn new(up: u64, down: u64) -> Self {
        Self { up, down }
    }

    /// Saturates at `u64::MAX`; counts come straight from backend JSON.
    pub fn total(&self) -> u64 {
        self.up.saturating_add(self.down)
    }

    pub fn is_active(&self) -> bool {
        self.total() > 0
    }

    pub fn net(&self) -> i64 {
        let net = i128::from(self.up) - i128::from(self.down);
        i64::try_from(net).unwrap_or(if net > 0 { i64::MAX } else { i64::MIN })
    }
}

/// Per-species vote counts. The backend sends the flat `up_<species>` /
/// `down_<species>` form; missing or null keys count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FlatVoteSummary", into = "FlatVoteSummary")]
pub struct VoteSummary {
    pub human: Tally,
    pub ai: Tally,
    pub company: Tally,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct FlatVoteSummary {
    #[serde(default)]
    up_human: Option<u64>,
    #[serde(default)]
    down_human: Option<u64>,
    #[serde(default)]
    up_ai: Option<u64>,
    #[serde(default)]
    down_ai: Option<u64>,
    #[serde(default)]
    up_company: Option<u64>,
    #[serde(default)]
    down_company: Option<u64>,
}

impl From<FlatVoteSummary> for VoteSummary {
    fn from(flat: FlatVoteSummary) -> Self {
        Self {
            human: Tally::new(flat.up_human.unwrap_or(0), flat.down_human.unwrap_or(0)),
            ai: Tally::new(flat.up_ai.unwrap_or(0), flat.down_ai.unwrap_or(0)),
            company: Tally::new(flat.up_company.unwrap_or(0), flat.down_company.unwrap_or(0)),
        }
    }
}

impl From<VoteSummary> for FlatVoteSummary {
    fn from(summary: VoteSummary) -> Self {
        Self {
            up_human: Some(summary.human.up),
            down_human: Some(summary.human.down),
            up_ai: Some(summary.ai.up),
            down_ai: Some(summary.ai.down),
            up_company: Some(summary.company.up),
            down_company: Some(summary.company.down),
        }
    }
}

impl VoteSummary {
    pub fn with(mut self, species: Species, up: u64, down: u64) -> Self {
        *self.get_mut(species) = Tally::new(up, down);
        self
    }

    pub fn get(&self, species: Species) -> Tally {
        match species {
            Species::Human => self.human,
            Species::Ai => self.ai,
            Species::Company => self.company,
        }
    }

    pub fn get_mut(&mut self, species: Species) -> &mut Tally {
        match species {
            Species::Human => &mut self.human,
            Species::Ai => &mut self.ai,
            Species::Company => &mut self.company,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Species, Tally)> + '_ {
        Species::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, tally)| !tally.is_active())
    }

    pub fn record(&mut self, species: Species, choice: VoteChoice) {
        let tally = self.get_mut(species);
        match choice {
            VoteChoice::Up => tally.up = tally.up.saturating_add(1),
            VoteChoice::Down => tally.down = tally.down.saturating_add(1),
        }
    }

    pub fn retract(&mut self, species: Species, choice: VoteChoice) {
        let tally = self.get_mut(species);
        match choice {
            VoteChoice::Up => tally.up = tally.up.saturating_sub(1),
            VoteChoice::Down => tally.down = tally.down.saturating_sub(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Up,
    Down,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::Up => "up",
            VoteChoice::Down => "down",
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteRequest {
    pub proposal_id: i64,
    pub username: String,
    pub choice: VoteChoice,
    pub voter_type: Species,
}

/// A single voter entry on a proposal's `likes` / `dislikes` lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    #[serde(rename = "type", default)]
    pub voter_type: Species,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub proposal_id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_img: Option<String>,
    #[serde(default)]
    pub species: Species,
    pub comment: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentRequest {
    pub proposal_id: i64,
    pub user: String,
    pub comment: String,
    pub species: Species,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    #[default]
    Active,
    Passed,
    Rejected,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalMedia {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Link,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
    #[serde(rename = "userName", default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(rename = "userInitials", default, skip_serializing_if = "Option::is_none")]
    pub user_initials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_type: Option<Species>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_img: Option<String>,
    #[serde(default)]
    pub status: ProposalStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_deadline: Option<String>,
    #[serde(default)]
    pub votes_summary: VoteSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<ProposalMedia>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<Vec<VoteRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dislikes: Option<Vec<VoteRecord>>,
}

impl Proposal {
    pub fn author_display_name(&self) -> String {
        self.user_name
            .clone()
            .or_else(|| self.author_username.clone())
            .unwrap_or_else(|| format!("User {}", self.author_id))
    }

    /// Vote counts, taken from `votes_summary` or, when that is empty,
    /// tallied from the per-voter `likes` / `dislikes` lists.
    pub fn vote_summary(&self) -> VoteSummary {
        if !self.votes_summary.is_empty() {
            return self.votes_summary;
        }

        let mut summary = VoteSummary::default();
        for record in self.likes.iter().flatten() {
            summary.record(record.voter_type, VoteChoice::Up);
        }
        for record in self.dislikes.iter().flatten() {
            summary.record(record.voter_type, VoteChoice::Down);
        }
        summary
    }

    /// The one attachment shown for the proposal: video, then image, then
    /// link, then file. Nested `media` entries win over top-level fields.
    pub fn primary_media(&self) -> Option<MediaRef> {
        let media = self.media.clone().unwrap_or_default();
        let candidates = [
            (MediaKind::Video, media.video.or_else(|| self.video.clone())),
            (MediaKind::Image, media.image.or_else(|| self.image.clone())),
            (MediaKind::Link, media.link.or_else(|| self.link.clone())),
            (MediaKind::File, media.file.or_else(|| self.file.clone())),
        ];

        candidates.into_iter().find_map(|(kind, url)| {
            url.filter(|u| !u.trim().is_empty())
                .map(|url| MediaRef { kind, url })
        })
    }
}

/// Makes a backend-relative media path absolute.
pub fn resolve_media_url(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{}{}", base, url)
    } else {
        format!("{}/{}", base, url)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProposalFilter {
    #[default]
    All,
    Latest,
    Oldest,
    TopLiked,
    LessLiked,
    Popular,
    Ai,
    Company,
    Human,
}

impl ProposalFilter {
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            ProposalFilter::All => None,
            ProposalFilter::Latest => Some("latest"),
            ProposalFilter::Oldest => Some("oldest"),
            ProposalFilter::TopLiked => Some("topLikes"),
            ProposalFilter::LessLiked => Some("fewestLikes"),
            ProposalFilter::Popular => Some("popular"),
            ProposalFilter::Ai => Some("ai"),
            ProposalFilter::Company => Some("company"),
            ProposalFilter::Human => Some("human"),
        }
    }
}

impl FromStr for ProposalFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "All" => Ok(ProposalFilter::All),
            "Latest" => Ok(ProposalFilter::Latest),
            "Oldest" => Ok(ProposalFilter::Oldest),
            "Top Liked" => Ok(ProposalFilter::TopLiked),
            "Less Liked" => Ok(ProposalFilter::LessLiked),
            "Popular" => Ok(ProposalFilter::Popular),
            "AI" => Ok(ProposalFilter::Ai),
            "Company" => Ok(ProposalFilter::Company),
            "Human" => Ok(ProposalFilter::Human),
            other => Err(format!("unknown proposal filter '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalQuery {
    pub filter: ProposalFilter,
    pub search: Option<String>,
}

impl ProposalQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(filter) = self.filter.query_value() {
            params.push(("filter", filter.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Harmonizer,
    Vibenode,
    Proposal,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree_centrality: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkLink {
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default)]
    pub link_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<NetworkNode>,
    #[serde(default)]
    pub edges: Vec<NetworkLink>,
    #[serde(default)]
    pub metrics: GraphMetrics,
}

impl GraphData {
    pub fn vibenodes(&self) -> Vec<VibeNode> {
        self.nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Vibenode)
            .map(VibeNode::from_graph_node)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricValues {
    pub total_harmonizers: u64,
    pub total_vibenodes: u64,
    #[serde(deserialize_with = "string_or_number")]
    pub community_wellspring: String,
    pub current_system_entropy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
    pub metrics: MetricValues,
    #[serde(default)]
    pub mission: String,
}

/// Entropy at which harmony reads 0%.
const ENTROPY_CHAOS: f64 = 2000.0;

impl SystemMetrics {
    pub fn harmony_pct(&self) -> f64 {
        ((1.0 - self.metrics.current_system_entropy / ENTROPY_CHAOS) * 100.0).clamp(0.0, 100.0)
    }

    pub fn wellspring_value(&self) -> f64 {
        self.metrics.community_wellspring.trim().parse().unwrap_or(0.0)
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.status.as_str(), "simulation" | "offline")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_summary_from_flat_wire_form() {
        let summary: VoteSummary =
            serde_json::from_str(r#"{"up_human": 8, "down_human": 2, "up_ai": null}"#).unwrap();

        assert_eq!(summary.human, Tally::new(8, 2));
        assert_eq!(summary.ai, Tally::default());
        assert_eq!(summary.company, Tally::default());
    }

    #[test]
    fn test_vote_summary_serializes_flat() {
        let summary = VoteSummary::default().with(Species::Company, 3, 1);
        let value = serde_json::to_value(summary).unwrap();
        assert_eq!(value["up_company"], 3);
        assert_eq!(value["down_company"], 1);
        assert_eq!(value["up_human"], 0);
    }

    #[test]
    fn test_retract_never_underflows() {
        let mut summary = VoteSummary::default();
        summary.retract(Species::Ai, VoteChoice::Down);
        assert_eq!(summary.ai, Tally::default());

        summary.record(Species::Ai, VoteChoice::Up);
        assert_eq!(summary.ai.net(), 1);
    }

    #[test]
    fn test_tally_saturates_at_limits() {
        let huge = Tally::new(u64::MAX, 1);
        assert_eq!(huge.total(), u64::MAX);
        assert!(huge.is_active());
        assert_eq!(huge.net(), i64::MAX);
        assert_eq!(Tally::new(0, u64::MAX).net(), i64::MIN);
        assert_eq!(Tally::new(9_300_000_000_000_000_000, 0).net(), i64::MAX);

        let mut summary = VoteSummary::default().with(Species::Human, u64::MAX, 0);
        summary.record(Species::Human, VoteChoice::Up);
        assert_eq!(summary.human.up, u64::MAX);
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("ada lovelace"), "AL");
        assert_eq!(initials("traveler"), "TR");
        assert_eq!(initials("   "), "");
        assert_eq!(initials("x"), "X");
    }

    #[test]
    fn test_proposal_media_precedence() {
        let proposal: Proposal = serde_json::from_value(serde_json::json!({
            "id": 1,
            "image": "/uploads/top-level.png",
            "link": "https://example.org",
            "media": { "image": "/uploads/nested.png" }
        }))
        .unwrap();

        let media = proposal.primary_media().unwrap();
        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.url, "/uploads/nested.png");
        assert_eq!(
            resolve_media_url("https://api.example.org/", &media.url),
            "https://api.example.org/uploads/nested.png"
        );
    }

    #[test]
    fn test_vote_summary_falls_back_to_voter_lists() {
        let proposal: Proposal = serde_json::from_value(serde_json::json!({
            "id": 7,
            "likes": [{"type": "human"}, {"type": "ai"}, {"type": "human"}],
            "dislikes": [{"type": "company"}]
        }))
        .unwrap();

        let summary = proposal.vote_summary();
        assert_eq!(summary.human, Tally::new(2, 0));
        assert_eq!(summary.ai, Tally::new(1, 0));
        assert_eq!(summary.company, Tally::new(0, 1));
        assert_eq!(proposal.author_display_name(), "User 0");
    }

    #[test]
    fn test_proposal_filter_labels() {
        assert_eq!("Top Liked".parse::<ProposalFilter>().unwrap().query_value(), Some("topLikes"));
        assert_eq!("All".parse::<ProposalFilter>().unwrap().query_value(), None);

        let query = ProposalQuery {
            filter: ProposalFilter::Company,
            search: Some("solar".to_string()),
        };
        assert_eq!(
            query.params(),
            vec![("filter", "company".to_string()), ("search", "solar".to_string())]
        );
    }

    #[test]
    fn test_vibenode_ids_from_graph_nodes() {
        let node = NetworkNode {
            id: "v_42".to_string(),
            label: "Signal".to_string(),
            node_type: NodeType::Vibenode,
            echo: Some(2.5),
            degree_centrality: None,
        };
        let vibe = VibeNode::from_graph_node(&node);
        assert_eq!(vibe.id, 42);
        assert_eq!(vibe.echo_value(), 2.5);

        let other = NetworkNode { id: "sim_node_3".to_string(), ..node };
        let first = VibeNode::from_graph_node(&other).id;
        assert_eq!(first, VibeNode::from_graph_node(&other).id);
        assert!((0..100_000).contains(&first));
    }

    #[test]
    fn test_metrics_accepts_numeric_wellspring() {
        let metrics: SystemMetrics = serde_json::from_value(serde_json::json!({
            "status": "online",
            "timestamp": "2026-01-01T00:00:00Z",
            "metrics": {
                "total_harmonizers": 3,
                "total_vibenodes": 9,
                "community_wellspring": 120.5,
                "current_system_entropy": 500.0
            },
            "mission": "m"
        }))
        .unwrap();

        assert_eq!(metrics.wellspring_value(), 120.5);
        assert_eq!(metrics.harmony_pct(), 75.0);
        assert!(!metrics.is_simulated());
    }
}
