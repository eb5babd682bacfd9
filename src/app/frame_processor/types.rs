// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing results
//!
//! These types represent what the scanner surfaces to the user and decide
//! which affordances the code overlay offers.

use crate::constants::qr::URL_SCHEMES;

/// How a detected code is presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeClass {
    /// Content contains a web link; the overlay offers an "open" action
    Url(String),
    /// Anything else, shown as text only
    Plain,
}

impl CodeClass {
    /// Classify QR content
    ///
    /// A payload is URL-class when it contains an `http://` or `https://`
    /// scheme anywhere. The link runs from the scheme to the next whitespace.
    pub fn classify(content: &str) -> Self {
        let start = URL_SCHEMES
            .iter()
            .filter_map(|scheme| content.find(scheme))
            .min();

        match start {
            Some(start) => {
                let link = &content[start..];
                let end = link.find(char::is_whitespace).unwrap_or(link.len());
                Self::Url(link[..end].to_string())
            }
            None => Self::Plain,
        }
    }
}

/// A code accepted by the debouncer and shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCode {
    /// Raw decoded content
    pub payload: String,
    /// Presentation class derived from the payload
    pub class: CodeClass,
}

impl DetectedCode {
    pub fn new(payload: impl Into<String>) -> Self {
        let payload = payload.into();
        let class = CodeClass::classify(&payload);
        Self { payload, class }
    }

    /// Whether the overlay shows the "open" affordance
    pub fn is_url(&self) -> bool {
        matches!(self.class, CodeClass::Url(_))
    }

    /// Link to open, if any
    pub fn url(&self) -> Option<&str> {
        match &self.class {
            CodeClass::Url(url) => Some(url),
            CodeClass::Plain => None,
        }
    }
}
