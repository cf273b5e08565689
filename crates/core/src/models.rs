use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_HISTORY_MESSAGES: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    InfoCollection,
    SearchRequest,
    PlanningRequest,
    CalendarAction,
    ShareAction,
    ModificationRequest,
    GeneralConversation,
}

impl Intent {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "info_collection" => Some(Self::InfoCollection),
            "search_request" => Some(Self::SearchRequest),
            "planning_request" => Some(Self::PlanningRequest),
            "calendar_action" => Some(Self::CalendarAction),
            "share_action" => Some(Self::ShareAction),
            "modification_request" => Some(Self::ModificationRequest),
            "general_conversation" => Some(Self::GeneralConversation),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InfoCollection => "info_collection",
            Self::SearchRequest => "search_request",
            Self::PlanningRequest => "planning_request",
            Self::CalendarAction => "calendar_action",
            Self::ShareAction => "share_action",
            Self::ModificationRequest => "modification_request",
            Self::GeneralConversation => "general_conversation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelStyle {
    Culture,
    Nature,
    Food,
    Shopping,
    Activity,
    Photo,
}

impl TravelStyle {
    pub const ALL: [Self; 6] = [
        Self::Culture,
        Self::Nature,
        Self::Food,
        Self::Shopping,
        Self::Activity,
        Self::Photo,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "culture" => Some(Self::Culture),
            "nature" => Some(Self::Nature),
            "food" => Some(Self::Food),
            "shopping" => Some(Self::Shopping),
            "activity" => Some(Self::Activity),
            "photo" => Some(Self::Photo),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Culture => "culture",
            Self::Nature => "nature",
            Self::Food => "food",
            Self::Shopping => "shopping",
            Self::Activity => "activity",
            Self::Photo => "photo",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Culture => "문화/역사 탐방",
            Self::Nature => "자연/힐링",
            Self::Food => "맛집 투어",
            Self::Shopping => "쇼핑/도시",
            Self::Activity => "액티비티/모험",
            Self::Photo => "인스타/감성",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Culture => "🏛️",
            Self::Nature => "🌊",
            Self::Food => "🍽️",
            Self::Shopping => "🛍️",
            Self::Activity => "🎡",
            Self::Photo => "📸",
        }
    }

    pub fn blurb(self) -> &'static str {
        match self {
            Self::Culture => "박물관, 유적지, 전통 문화 체험",
            Self::Nature => "바다, 산, 공원에서의 휴식과 치유",
            Self::Food => "현지 맛집과 특색 있는 음식 탐방",
            Self::Shopping => "쇼핑몰, 시장, 도심 명소 탐방",
            Self::Activity => "테마파크, 익스트림 스포츠, 체험 활동",
            Self::Photo => "예쁜 카페, 포토존, 감성 장소",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Budget,
    Moderate,
    Comfortable,
    Luxury,
    Unlimited,
}

impl BudgetTier {
    pub const ALL: [Self; 5] = [
        Self::Budget,
        Self::Moderate,
        Self::Comfortable,
        Self::Luxury,
        Self::Unlimited,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "budget" => Some(Self::Budget),
            "moderate" => Some(Self::Moderate),
            "comfortable" => Some(Self::Comfortable),
            "luxury" => Some(Self::Luxury),
            "unlimited" => Some(Self::Unlimited),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Moderate => "moderate",
            Self::Comfortable => "comfortable",
            Self::Luxury => "luxury",
            Self::Unlimited => "unlimited",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Budget => "가성비 여행",
            Self::Moderate => "적당한 여행",
            Self::Comfortable => "여유로운 여행",
            Self::Luxury => "럭셔리 여행",
            Self::Unlimited => "예산 무관",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Budget => "💸",
            Self::Moderate => "💳",
            Self::Comfortable => "💎",
            Self::Luxury => "👑",
            Self::Unlimited => "🤷",
        }
    }

    pub fn range_label(self) -> &'static str {
        match self {
            Self::Budget => "~10만원",
            Self::Moderate => "10-30만원",
            Self::Comfortable => "30-50만원",
            Self::Luxury => "50만원+",
            Self::Unlimited => "예산 무관",
        }
    }

    /// Conversational form used in normalizer acknowledgements ("가성비 예산으로 ...").
    pub fn spoken_label(self) -> &'static str {
        match self {
            Self::Budget => "가성비",
            Self::Moderate => "적당한",
            Self::Comfortable => "여유로운",
            Self::Luxury => "럭셔리",
            Self::Unlimited => "예산 무관",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanionType {
    Solo,
    Couple,
    Family,
    Friends,
    Group,
}

impl CompanionType {
    pub const ALL: [Self; 5] = [
        Self::Solo,
        Self::Couple,
        Self::Family,
        Self::Friends,
        Self::Group,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "solo" => Some(Self::Solo),
            "couple" => Some(Self::Couple),
            "family" => Some(Self::Family),
            "friends" => Some(Self::Friends),
            "group" => Some(Self::Group),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::Couple => "couple",
            Self::Family => "family",
            Self::Friends => "friends",
            Self::Group => "group",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Solo => "혼자",
            Self::Couple => "연인/배우자",
            Self::Family => "가족",
            Self::Friends => "친구들",
            Self::Group => "단체",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Solo => "🙋",
            Self::Couple => "💑",
            Self::Family => "👨‍👩‍👧‍👦",
            Self::Friends => "👫",
            Self::Group => "👥",
        }
    }

    /// Conversational form used in normalizer acknowledgements ("연인과 여행하고 싶어요").
    pub fn spoken_label(self) -> &'static str {
        match self {
            Self::Solo => "혼자",
            Self::Couple => "연인과",
            Self::Family => "가족과",
            Self::Friends => "친구들과",
            Self::Group => "단체로",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripDuration {
    pub name: String,
    pub days: u32,
    pub nights: u32,
}

impl TripDuration {
    pub fn new(name: &str, days: u32, nights: u32) -> Self {
        Self {
            name: name.to_string(),
            days,
            nights,
        }
    }

    pub fn from_token(value: &str) -> Option<Self> {
        let (name, days, nights) = match value.trim() {
            "day_trip" => ("당일치기", 1, 0),
            "1n2d" => ("1박 2일", 2, 1),
            "2n3d" => ("2박 3일", 3, 2),
            "3n4d" => ("3박 4일", 4, 3),
            "4n5d" => ("4박 5일", 5, 4),
            "week_plus" => ("일주일 이상", 7, 6),
            _ => return None,
        };
        Some(Self::new(name, days, nights))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredSlot {
    Destination,
    TravelStyle,
    Duration,
    DepartureDate,
    CompanionType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub destination: Option<String>,
    pub travel_style: Option<TravelStyle>,
    pub duration: Option<TripDuration>,
    pub departure_date: Option<String>,
    pub budget: Option<BudgetTier>,
    pub companion_type: Option<CompanionType>,
}

impl UserPreferences {
    /// Missing required slots in fixed collection order. Budget is optional.
    pub fn missing_required(&self) -> Vec<RequiredSlot> {
        let mut missing = Vec::new();
        if self.destination.is_none() {
            missing.push(RequiredSlot::Destination);
        }
        if self.travel_style.is_none() {
            missing.push(RequiredSlot::TravelStyle);
        }
        if self.duration.is_none() {
            missing.push(RequiredSlot::Duration);
        }
        if self.departure_date.is_none() {
            missing.push(RequiredSlot::DepartureDate);
        }
        if self.companion_type.is_none() {
            missing.push(RequiredSlot::CompanionType);
        }
        missing
    }

    pub fn is_ready_for_planning(&self) -> bool {
        self.missing_required().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl Place {
    pub fn new(name: &str, category: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            address: None,
            rating: None,
            price_range: None,
            opening_hours: None,
            cuisine_type: None,
            source_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub region: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub popularity_score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationDetails {
    pub destination: String,
    pub travel_style: String,
    pub places: Vec<Place>,
    pub restaurants: Vec<Place>,
    pub accommodations: Vec<Place>,
    pub activities: Vec<Place>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub time: String,
    pub activity: String,
    pub location: String,
    pub duration_minutes: u32,
    pub category: String,
    pub estimated_cost: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: String,
    pub day_number: u32,
    pub events: Vec<ScheduleItem>,
    pub total_cost: u32,
    pub travel_time_minutes: u32,
}

impl DaySchedule {
    pub fn recompute(&mut self) {
        self.total_cost = self.events.iter().map(|e| e.estimated_cost).sum();
        self.travel_time_minutes = 20 * (self.events.len().saturating_sub(1) as u32);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPlan {
    pub id: String,
    pub title: String,
    pub destination: String,
    pub user_preferences: UserPreferences,
    pub schedule: Vec<DaySchedule>,
    pub recommended_places: Vec<Place>,
    pub total_budget: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TravelPlan {
    pub fn recompute_totals(&mut self) {
        for day in &mut self.schedule {
            day.recompute();
        }
        self.total_budget = self.schedule.iter().map(|d| d.total_cost).sum();
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelPhase {
    Greeting,
    DestinationSelection,
    PreferenceCollection,
    DetailedPlanning,
    PlanGeneration,
    ActionSelection,
    CalendarManagement,
    Sharing,
}

impl TravelPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::DestinationSelection => "destination_selection",
            Self::PreferenceCollection => "preference_collection",
            Self::DetailedPlanning => "detailed_planning",
            Self::PlanGeneration => "plan_generation",
            Self::ActionSelection => "action_selection",
            Self::CalendarManagement => "calendar_management",
            Self::Sharing => "sharing",
        }
    }
}

/// Follow-up state for a plan edit that still needs a place name from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationTarget {
    AddPlace,
    RemovePlace,
}

/// Typed slot writes. Every mutation of collected preferences goes through
/// one of these variants; free-form classifier output never lands directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum SlotUpdate {
    Destination { name: String },
    TravelStyle { style: TravelStyle },
    Duration { duration: TripDuration },
    DepartureDate { date: String },
    Budget { tier: BudgetTier },
    CompanionType { companion: CompanionType },
    SelectedPlace { place: Place },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelSession {
    pub session_id: String,
    pub current_phase: TravelPhase,
    pub preferences: UserPreferences,
    pub available_destinations: Vec<Destination>,
    pub destination_details: Option<DestinationDetails>,
    pub selected_places: Vec<Place>,
    pub travel_plan: Option<TravelPlan>,
    pub conversation_history: Vec<Message>,
    pub pending_auth_code: Option<String>,
    pub pending_modification: Option<ModificationTarget>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TravelSession {
    pub fn new(session_id: &str) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.to_string(),
            current_phase: TravelPhase::Greeting,
            preferences: UserPreferences::default(),
            available_destinations: Vec::new(),
            destination_details: None,
            selected_places: Vec::new(),
            travel_plan: None,
            conversation_history: Vec::new(),
            pending_auth_code: None,
            pending_modification: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Wholesale reset for a fresh planning round; keeps only the session id.
    pub fn reset(&mut self) {
        *self = Self::new(&self.session_id.clone());
    }

    pub fn update_phase(&mut self, phase: TravelPhase) {
        self.current_phase = phase;
        self.updated_at = Utc::now();
    }

    pub fn add_message(&mut self, role: MessageRole, content: &str) {
        self.conversation_history.push(Message {
            role,
            content: content.to_string(),
            at: Utc::now(),
        });
        if self.conversation_history.len() > MAX_HISTORY_MESSAGES {
            let excess = self.conversation_history.len() - MAX_HISTORY_MESSAGES;
            self.conversation_history.drain(0..excess);
        }
        self.updated_at = Utc::now();
    }

    pub fn recent_context(&self, last_n: usize) -> &[Message] {
        let len = self.conversation_history.len();
        &self.conversation_history[len.saturating_sub(last_n)..]
    }

    pub fn apply_update(&mut self, update: SlotUpdate) {
        match update {
            SlotUpdate::Destination { name } => self.preferences.destination = Some(name),
            SlotUpdate::TravelStyle { style } => self.preferences.travel_style = Some(style),
            SlotUpdate::Duration { duration } => self.preferences.duration = Some(duration),
            SlotUpdate::DepartureDate { date } => self.preferences.departure_date = Some(date),
            SlotUpdate::Budget { tier } => self.preferences.budget = Some(tier),
            SlotUpdate::CompanionType { companion } => {
                self.preferences.companion_type = Some(companion)
            }
            SlotUpdate::SelectedPlace { place } => self.selected_places.push(place),
        }
        self.updated_at = Utc::now();
    }

    pub fn is_ready_for_planning(&self) -> bool {
        self.preferences.is_ready_for_planning()
    }
}

/// Structured values the classifier may extract from one utterance.
/// Unknown keys in the model output are dropped during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInfo {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub travel_style: Option<String>,
    #[serde(default)]
    pub duration: Option<TripDuration>,
    #[serde(default)]
    pub departure_date: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub companion_type: Option<String>,
}

impl ExtractedInfo {
    pub fn is_empty(&self) -> bool {
        self.destination.is_none()
            && self.travel_style.is_none()
            && self.duration.is_none()
            && self.departure_date.is_none()
            && self.budget.is_none()
            && self.companion_type.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentParams {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, rename = "type")]
    pub target: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub place: Option<Place>,
    #[serde(default)]
    pub place_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    pub confidence: f32,
    #[serde(default)]
    pub extracted_info: ExtractedInfo,
    #[serde(default)]
    pub agent_params: AgentParams,
}

impl IntentResult {
    pub fn bare(intent: Intent, confidence: f32) -> Self {
        Self {
            intent,
            confidence,
            extracted_info: ExtractedInfo::default(),
            agent_params: AgentParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOption {
    pub text: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResponseOption {
    pub fn new(text: &str, value: &str) -> Self {
        Self {
            text: text.to_string(),
            value: value.to_string(),
            description: None,
        }
    }

    pub fn with_description(text: &str, value: &str, description: &str) -> Self {
        Self {
            text: text.to_string(),
            value: value.to_string(),
            description: Some(description.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ResponseOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<TravelPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_phase: Option<TravelPhase>,
}

impl TurnResponse {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStatistics {
    pub total_days: u32,
    pub total_events: u32,
    pub total_budget: u32,
    pub average_daily_budget: u32,
    pub events_by_category: Vec<(String, u32)>,
    pub daily_budgets: Vec<u32>,
}
