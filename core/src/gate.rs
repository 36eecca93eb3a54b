//! Access gate — decides, per target view, whether to render or redirect.
//!
//! POLICY: the tutorial is required before Dashboard and Classify for
//! everyone; authentication is not. Anonymous users may classify and are
//! asked to sign up when they save. Logging out resets the tutorial flag.
//!
//! The gate is a finite-state machine over two facts:
//!
//!   Fresh ──tutorial──▶ VideoSeen ──authenticate──▶ AuthenticatedAndVideoSeen
//!     │                                                  ▲
//!     └──authenticate──▶ Authenticated ──tutorial────────┘
//!
//!   any state ──logout──▶ Fresh

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Start,
    Tutorial,
    SignUp,
    LogIn,
    Dashboard,
    Classify,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Start,
        View::Tutorial,
        View::SignUp,
        View::LogIn,
        View::Dashboard,
        View::Classify,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Start     => "/",
            Self::Tutorial  => "/video-tutorial",
            Self::SignUp    => "/signup",
            Self::LogIn     => "/login",
            Self::Dashboard => "/dashboard",
            Self::Classify  => "/classify",
        }
    }

    /// Route a URL path. Unknown paths land on Start.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL
            .into_iter()
            .find(|v| v.path() == trimmed)
            .unwrap_or(Self::Start)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Fresh,
    VideoSeen,
    Authenticated,
    AuthenticatedAndVideoSeen,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GateAction {
    CompleteTutorial,
    SkipTutorial,
    Authenticate,
    Logout,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "decision", content = "view", rename_all = "snake_case")]
pub enum RenderDecision {
    Render(View),
    Redirect(View),
}

impl RenderDecision {
    /// The view that ends up on screen.
    pub fn view(self) -> View {
        match self {
            Self::Render(v) | Self::Redirect(v) => v,
        }
    }
}

impl GateState {
    pub fn from_facts(is_authenticated: bool, has_seen_video: bool) -> Self {
        match (is_authenticated, has_seen_video) {
            (false, false) => Self::Fresh,
            (false, true)  => Self::VideoSeen,
            (true, false)  => Self::Authenticated,
            (true, true)   => Self::AuthenticatedAndVideoSeen,
        }
    }

    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated | Self::AuthenticatedAndVideoSeen)
    }

    pub fn has_seen_video(self) -> bool {
        matches!(self, Self::VideoSeen | Self::AuthenticatedAndVideoSeen)
    }

    pub fn apply(self, action: GateAction) -> Self {
        match action {
            GateAction::CompleteTutorial | GateAction::SkipTutorial => {
                Self::from_facts(self.is_authenticated(), true)
            }
            GateAction::Authenticate => Self::from_facts(true, self.has_seen_video()),
            GateAction::Logout => Self::Fresh,
        }
    }

    pub fn decide(self, target: View) -> RenderDecision {
        match target {
            View::Start | View::Tutorial => RenderDecision::Render(target),
            View::SignUp | View::LogIn if self.is_authenticated() => {
                RenderDecision::Redirect(View::Dashboard)
            }
            View::SignUp | View::LogIn => RenderDecision::Render(target),
            View::Dashboard | View::Classify if !self.has_seen_video() => {
                RenderDecision::Redirect(View::Tutorial)
            }
            View::Dashboard | View::Classify => RenderDecision::Render(target),
        }
    }
}

/// Where the tutorial sends the user once completed or skipped.
pub const AFTER_TUTORIAL: View = View::Dashboard;
