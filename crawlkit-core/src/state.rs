use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A DOM state discovered by the crawler.
///
/// Two states are the same state when their stripped DOMs are equal. The
/// id, name, url and raw DOM are bookkeeping and do not take part in
/// equality or hashing.
///
/// When deserialized without a `stripped_dom`, the raw DOM is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StateVertexRepr")]
pub struct StateVertex {
    pub id: u64,
    pub name: String,
    pub url: String,
    /// Raw DOM as captured from the browser.
    pub dom: String,
    /// DOM after the engine's stripping rules were applied.
    pub stripped_dom: String,
}

#[derive(Deserialize)]
struct StateVertexRepr {
    id: u64,
    name: String,
    url: String,
    dom: String,
    #[serde(default)]
    stripped_dom: Option<String>,
}

impl From<StateVertexRepr> for StateVertex {
    fn from(repr: StateVertexRepr) -> Self {
        let stripped_dom = repr.stripped_dom.unwrap_or_else(|| repr.dom.clone());
        Self::new(repr.id, repr.name, repr.url, repr.dom, stripped_dom)
    }
}

impl StateVertex {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        url: impl Into<String>,
        dom: impl Into<String>,
        stripped_dom: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
            dom: dom.into(),
            stripped_dom: stripped_dom.into(),
        }
    }

    /// State whose stripped DOM is the raw DOM itself.
    pub fn unstripped(
        id: u64,
        name: impl Into<String>,
        url: impl Into<String>,
        dom: impl Into<String>,
    ) -> Self {
        let dom = dom.into();
        Self::new(id, name, url, dom.clone(), dom)
    }

    #[inline]
    pub fn dom(&self) -> &str {
        &self.dom
    }

    #[inline]
    pub fn stripped_dom(&self) -> &str {
        &self.stripped_dom
    }
}

impl PartialEq for StateVertex {
    fn eq(&self, other: &Self) -> bool {
        self.stripped_dom == other.stripped_dom
    }
}

impl Eq for StateVertex {}

impl Hash for StateVertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.stripped_dom.hash(state);
    }
}

/// Kind of browser event an eventable fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Click,
    Hover,
    Enter,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::Hover => "hover",
            EventType::Enter => "enter",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An event fired on an element, i.e. an edge of the state graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eventable {
    pub id: u64,
    pub event_type: EventType,
    pub xpath: String,
    #[serde(default)]
    pub element_text: String,
    #[serde(default)]
    pub source_state: Option<String>,
    #[serde(default)]
    pub target_state: Option<String>,
}

impl Eventable {
    pub fn new(id: u64, event_type: EventType, xpath: impl Into<String>) -> Self {
        Self {
            id,
            event_type,
            xpath: xpath.into(),
            element_text: String::new(),
            source_state: None,
            target_state: None,
        }
    }
}

impl std::fmt::Display for Eventable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.event_type, self.xpath)
    }
}

/// An element the crawler is about to fire events on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateElement {
    pub xpath: String,
    #[serde(default)]
    pub element_text: String,
    /// Frame identification when the element lives inside an iframe.
    #[serde(default)]
    pub related_frame: Option<String>,
}

impl CandidateElement {
    pub fn new(xpath: impl Into<String>) -> Self {
        Self {
            xpath: xpath.into(),
            element_text: String::new(),
            related_frame: None,
        }
    }
}
