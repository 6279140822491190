use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a host window.
///
/// Kinds before `Dashboard` in the list below are reachable without a login;
/// everything else is a post-login window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Login,
    SignUp,
    ForgotPassword,
    FaceLogin,
    VoiceLogin,
    Dashboard,
    Settings,
    Profile,
    VoiceCommands,
    AddGame,
    Game,
}

impl WindowKind {
    pub const ALL: [WindowKind; 11] = [
        WindowKind::Login,
        WindowKind::SignUp,
        WindowKind::ForgotPassword,
        WindowKind::FaceLogin,
        WindowKind::VoiceLogin,
        WindowKind::Dashboard,
        WindowKind::Settings,
        WindowKind::Profile,
        WindowKind::VoiceCommands,
        WindowKind::AddGame,
        WindowKind::Game,
    ];

    pub fn is_post_login(self) -> bool {
        !matches!(
            self,
            WindowKind::Login
                | WindowKind::SignUp
                | WindowKind::ForgotPassword
                | WindowKind::FaceLogin
                | WindowKind::VoiceLogin
        )
    }

    /// Where the session lands after a logout.
    pub fn login_equivalent() -> Self {
        WindowKind::Login
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WindowKind::Login => "login",
            WindowKind::SignUp => "sign_up",
            WindowKind::ForgotPassword => "forgot_password",
            WindowKind::FaceLogin => "face_login",
            WindowKind::VoiceLogin => "voice_login",
            WindowKind::Dashboard => "dashboard",
            WindowKind::Settings => "settings",
            WindowKind::Profile => "profile",
            WindowKind::VoiceCommands => "voice_commands",
            WindowKind::AddGame => "add_game",
            WindowKind::Game => "game",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        WindowKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| format!("Unknown window kind: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_login_split() {
        assert!(!WindowKind::Login.is_post_login());
        assert!(!WindowKind::SignUp.is_post_login());
        assert!(WindowKind::Dashboard.is_post_login());
        assert!(WindowKind::Game.is_post_login());
    }

    #[test]
    fn test_parse_accepts_spoken_forms() {
        assert_eq!("sign up".parse::<WindowKind>(), Ok(WindowKind::SignUp));
        assert_eq!("Voice-Commands".parse::<WindowKind>(), Ok(WindowKind::VoiceCommands));
        assert!("lobby".parse::<WindowKind>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for kind in WindowKind::ALL {
            assert_eq!(kind.to_string().parse::<WindowKind>(), Ok(kind));
        }
    }
}
