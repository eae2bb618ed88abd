use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
const SESSION_FILE: &str = "session.json";

/// Login state kept between CLI invocations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub server_url: String,
    pub token: Option<String>,
    pub user_name: Option<String>,
    pub role: Option<String>,
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: None,
            user_name: None,
            role: None,
            logged_in_at: None,
        }
    }
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn login(&mut self, token: String, user_name: String, role: Option<String>) {
        self.token = Some(token);
        self.user_name = Some(user_name);
        self.role = role;
        self.logged_in_at = Some(Utc::now());
    }

    /// Forget the identity, keep the server
    pub fn logout(&mut self) {
        self.token = None;
        self.user_name = None;
        self.role = None;
        self.logged_in_at = None;
    }
}

/// JSON session file inside the CLI config directory
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `VILLA_CLI_CONFIG_DIR`, or `~/.config/villa/cli`
    pub fn default_location() -> anyhow::Result<Self> {
        let dir = if let Ok(custom_dir) = std::env::var("VILLA_CLI_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
            PathBuf::from(home).join(".config").join("villa").join("cli")
        };
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_file(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    pub fn load(&self) -> anyhow::Result<Session> {
        let file = self.session_file();
        if !file.exists() {
            return Ok(Session::default());
        }

        let content = fs::read_to_string(file)?;
        let session: Session = serde_json::from_str(&content)?;
        Ok(session)
    }

    pub fn save(&self, session: &Session) -> anyhow::Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        fs::write(self.session_file(), content)?;
        Ok(())
    }

    /// Drop the stored identity; the server URL survives
    pub fn clear(&self) -> anyhow::Result<()> {
        let mut session = self.load()?;
        session.logout();
        self.save(&session)
    }
}
