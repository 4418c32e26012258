//! Browser-side wallet gate, modelled so the storefront's route rules have one
//! definition.
//!
//! This is UI state only. An address here was never proven by a signature and
//! must not be treated as an authenticated identity.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    Connect(String),
    Disconnect,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    wallet_address: Option<String>,
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` and leaves the session untouched for a blank address.
    pub fn connect(&mut self, address: &str) -> bool {
        let address = address.trim();
        if address.is_empty() {
            return false;
        }
        self.wallet_address = Some(address.to_string());
        true
    }

    pub fn disconnect(&mut self) {
        self.wallet_address = None;
    }

    pub fn apply(&mut self, event: WalletEvent) {
        match event {
            WalletEvent::Connect(address) => {
                self.connect(&address);
            }
            WalletEvent::Disconnect => self.disconnect(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.wallet_address.is_some()
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet_address.as_deref()
    }

    /// `0x12ab...cdef` style label used in headers and the dashboard greeting.
    pub fn short_address(&self) -> Option<String> {
        let address = self.wallet_address.as_deref()?;
        let chars: Vec<char> = address.chars().collect();
        if chars.len() <= 10 {
            return Some(address.to_string());
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        Some(format!("{head}...{tail}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    /// Only while disconnected.
    Public,
    /// Only while connected.
    Protected,
    Open,
}

pub struct RouteGuard;

impl RouteGuard {
    const PUBLIC: &'static [&'static str] = &["/"];
    const PROTECTED: &'static [&'static str] = &["/dashboard", "/checkout"];

    fn gate(path: &str) -> Gate {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
        if Self::PUBLIC.contains(&path) {
            Gate::Public
        } else if Self::PROTECTED.contains(&path) {
            Gate::Protected
        } else {
            Gate::Open
        }
    }

    pub fn check(path: &str, session: &WalletSession) -> Access {
        match (Self::gate(path), session.is_connected()) {
            (Gate::Public, true) => Access::Redirect("/dashboard"),
            (Gate::Protected, false) => Access::Redirect("/"),
            _ => Access::Allow,
        }
    }
}
