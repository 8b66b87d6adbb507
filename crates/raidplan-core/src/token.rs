//! Share and edit tokens, and resolving them to a plan with an access mode.
//!
//! A share token is 12 random bytes in unpadded base64url (16 characters).
//! An edit token is the share token followed by 24 more random bytes in the
//! same encoding (48 characters). Anyone holding the share token may view a
//! plan; only the edit token grants write access.

use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::error::{EditorError, EditorResult};
use crate::plan::{Plan, Tab};
use crate::storage::{PlanStore, StorageError};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub const SHARE_TOKEN_LEN: usize = 16;
pub const EDIT_TOKEN_LEN: usize = 48;
const SHARE_TOKEN_BYTES: usize = 12;
const EDIT_SECRET_BYTES: usize = 24;

/// Token parsing and resolution errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed plan token")]
    Malformed,
    #[error("no plan matches this token")]
    UnknownPlan,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What a resolved token allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn can_edit(self) -> bool {
        self == AccessMode::ReadWrite
    }

    /// Reject `operation` unless this mode allows writes.
    pub fn require_edit(self, operation: &'static str) -> EditorResult<()> {
        if self.can_edit() {
            Ok(())
        } else {
            log::debug!("Rejected {} under read-only access", operation);
            Err(EditorError::PermissionDenied { operation })
        }
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn well_formed(raw: &str, len: usize) -> bool {
    raw.len() == len && raw.chars().all(is_token_char)
}

/// Public, view-only token. Also the plan's storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareToken(String);

impl ShareToken {
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        if well_formed(raw, SHARE_TOKEN_LEN) {
            Ok(Self(raw.to_string()))
        } else {
            Err(TokenError::Malformed)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Secret token granting write access.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EditToken(String);

impl EditToken {
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        if well_formed(raw, EDIT_TOKEN_LEN) {
            Ok(Self(raw.to_string()))
        } else {
            Err(TokenError::Malformed)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The share token embedded as this token's prefix.
    pub fn share_token(&self) -> ShareToken {
        ShareToken(self.0[..SHARE_TOKEN_LEN].to_string())
    }
}

// Keep the secret out of logs.
impl fmt::Debug for EditToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EditToken({}…)", &self.0[..SHARE_TOKEN_LEN])
    }
}

macro_rules! string_conversions {
    ($token:ident) => {
        impl TryFrom<String> for $token {
            type Error = TokenError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                $token::parse(&value)
            }
        }

        impl From<$token> for String {
            fn from(token: $token) -> String {
                token.0
            }
        }

        impl fmt::Display for $token {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_conversions!(ShareToken);
string_conversions!(EditToken);

/// A syntactically classified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanToken {
    Share(ShareToken),
    Edit(EditToken),
}

impl PlanToken {
    /// Classify by length and alphabet.
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        match raw.len() {
            EDIT_TOKEN_LEN => EditToken::parse(raw).map(PlanToken::Edit),
            SHARE_TOKEN_LEN => ShareToken::parse(raw).map(PlanToken::Share),
            _ => Err(TokenError::Malformed),
        }
    }

    pub fn access_mode(&self) -> AccessMode {
        match self {
            PlanToken::Share(_) => AccessMode::ReadOnly,
            PlanToken::Edit(_) => AccessMode::ReadWrite,
        }
    }

    /// Storage key of the plan this token refers to.
    pub fn share_token(&self) -> ShareToken {
        match self {
            PlanToken::Share(share) => share.clone(),
            PlanToken::Edit(edit) => edit.share_token(),
        }
    }
}

/// Generate a fresh share/edit token pair.
pub fn generate_tokens() -> (ShareToken, EditToken) {
    let mut rng = rand::thread_rng();
    let mut share_bytes = [0u8; SHARE_TOKEN_BYTES];
    let mut secret_bytes = [0u8; EDIT_SECRET_BYTES];
    rng.fill_bytes(&mut share_bytes);
    rng.fill_bytes(&mut secret_bytes);

    let share = URL_SAFE_NO_PAD.encode(share_bytes);
    let edit = format!("{}{}", share, URL_SAFE_NO_PAD.encode(secret_bytes));
    (ShareToken(share), EditToken(edit))
}

/// Changes accepted by [`ResolvedPlan::apply_update`].
#[derive(Debug, Clone, Default)]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub boss: Option<String>,
    pub tabs: Option<Vec<Tab>>,
}

/// A plan together with the access its token granted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlan {
    pub plan: Plan,
    pub access: AccessMode,
}

impl ResolvedPlan {
    /// Open an editing session over the resolved plan.
    pub fn into_editor(self, config: EditorConfig) -> Editor {
        Editor::new(self.plan, self.access, config)
    }

    /// Replace plan metadata and content wholesale. Requires edit access.
    pub fn apply_update(&mut self, update: PlanUpdate) -> EditorResult<()> {
        self.access.require_edit("update plan")?;
        if let Some(tabs) = update.tabs {
            self.plan.replace_tabs(tabs)?;
        }
        if let Some(name) = update.name {
            self.plan.name = name;
        }
        if let Some(boss) = update.boss {
            self.plan.boss = boss;
        }
        Ok(())
    }
}

/// Resolves tokens against a plan store.
pub struct TokenResolver<S: PlanStore + ?Sized> {
    store: Arc<S>,
}

impl<S: PlanStore + ?Sized> TokenResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolve a raw token to its plan.
    ///
    /// Share resolutions are read-only and never carry the edit token. An
    /// edit-length token whose secret does not match is treated as unknown.
    pub async fn resolve(&self, raw: &str) -> Result<ResolvedPlan, TokenError> {
        let token = PlanToken::parse(raw)?;
        let key = token.share_token();
        let mut plan = match self.store.load(key.as_str()).await {
            Ok(plan) => plan,
            Err(StorageError::NotFound(_)) => return Err(TokenError::UnknownPlan),
            Err(e) => return Err(e.into()),
        };

        let access = token.access_mode();
        match &token {
            PlanToken::Edit(edit) if plan.edit_token() != Some(edit) => {
                log::warn!("Edit token mismatch for plan {}", key);
                return Err(TokenError::UnknownPlan);
            }
            PlanToken::Edit(_) => {}
            PlanToken::Share(_) => plan.redact_edit_token(),
        }
        log::debug!("Resolved plan {} with {:?} access", key, access);
        Ok(ResolvedPlan { plan, access })
    }
}
