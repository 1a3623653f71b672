//! Chat-line framing for envelopes on the wire and in history files.
//!
//! A line is the sender's account name, `": "`, then the envelope JSON:
//!
//! ```text
//! alice: {"encrypted_sym_key":"…","encrypted_message":"…"}
//! ```

use std::fmt;
use std::str::FromStr;

use crate::CryptoError;
use crate::envelope::Envelope;
use crate::rsa::{RsaPrivateKey, RsaPublicKey};

const SEPARATOR: &str = ": ";

/// One framed chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    sender: String,
    envelope: Envelope,
}

impl ChatLine {
    /// Frame an envelope under a sender name.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] if the name is empty or
    /// contains the separator or a line break.
    pub fn new(sender: impl Into<String>, envelope: Envelope) -> Result<Self, CryptoError> {
        let sender = sender.into();
        if sender.is_empty() || sender.contains(SEPARATOR) || sender.contains(['\n', '\r']) {
            return Err(CryptoError::InvalidParameter(format!(
                "invalid sender name {sender:?}"
            )));
        }
        Ok(Self { sender, envelope })
    }

    /// Seal `message` for `recipient` and frame it under `sender`.
    ///
    /// # Errors
    ///
    /// See [`Envelope::seal`] and [`ChatLine::new`].
    pub fn seal(
        sender: impl Into<String>,
        message: &str,
        recipient: &RsaPublicKey,
    ) -> Result<Self, CryptoError> {
        Self::new(sender, Envelope::seal(message, recipient)?)
    }

    /// Sender's account name.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// The framed envelope.
    #[must_use]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Open the framed envelope.
    ///
    /// # Errors
    ///
    /// See [`Envelope::open`].
    pub fn open(&self, private: &RsaPrivateKey) -> Result<String, CryptoError> {
        self.envelope.open(private)
    }
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.envelope.to_json().map_err(|_| fmt::Error)?;
        write!(f, "{}{SEPARATOR}{json}", self.sender)
    }
}

impl FromStr for ChatLine {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sender, json) = s
            .trim_end_matches(['\n', '\r'])
            .split_once(SEPARATOR)
            .ok_or_else(|| CryptoError::Decode("chat line has no sender separator".into()))?;
        Self::new(sender, Envelope::from_json(json)?)
    }
}
