//! TwiML generation for the voice provider
//!
//! The provider drives a live call by fetching an XML document from our
//! webhook endpoints and executing its verbs in order. This module builds
//! those documents; it deliberately covers only the verbs this service
//! speaks (`Say`, `Play`, `Gather`, `Hangup`).

use axum::http::header;
use axum::response::{IntoResponse, Response};

/// A digit-collection block: prompts are spoken, then the provider posts the
/// collected digits to `action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    num_digits: u32,
    action: String,
    method: String,
    timeout_secs: u32,
    prompts: Vec<(String, String)>,
}

impl Gather {
    pub fn new(num_digits: u32, action: &str, timeout_secs: u32) -> Self {
        Self {
            num_digits,
            action: action.to_string(),
            method: "POST".to_string(),
            timeout_secs,
            prompts: Vec::new(),
        }
    }

    /// Speak a prompt while waiting for digits.
    pub fn say(mut self, language: &str, text: &str) -> Self {
        self.prompts.push((language.to_string(), text.to_string()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Verb {
    Say { language: String, text: String },
    Play { url: String },
    Gather(Gather),
    Hangup,
}

/// Ordered sequence of verbs for one webhook response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, language: &str, text: &str) -> Self {
        self.verbs.push(Verb::Say {
            language: language.to_string(),
            text: text.to_string(),
        });
        self
    }

    pub fn play(mut self, url: &str) -> Self {
        self.verbs.push(Verb::Play {
            url: url.to_string(),
        });
        self
    }

    pub fn gather(mut self, gather: Gather) -> Self {
        self.verbs.push(Verb::Gather(gather));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    /// Render the full XML document.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>");

        for verb in &self.verbs {
            match verb {
                Verb::Say { language, text } => {
                    xml.push_str(&format!(
                        "<Say language=\"{}\">{}</Say>",
                        escape_attr(language),
                        escape_text(text)
                    ));
                }
                Verb::Play { url } => {
                    xml.push_str(&format!("<Play>{}</Play>", escape_text(url)));
                }
                Verb::Gather(gather) => {
                    xml.push_str(&format!(
                        "<Gather numDigits=\"{}\" action=\"{}\" method=\"{}\" timeout=\"{}\">",
                        gather.num_digits,
                        escape_attr(&gather.action),
                        escape_attr(&gather.method),
                        gather.timeout_secs
                    ));
                    for (language, text) in &gather.prompts {
                        xml.push_str(&format!(
                            "<Say language=\"{}\">{}</Say>",
                            escape_attr(language),
                            escape_text(text)
                        ));
                    }
                    xml.push_str("</Gather>");
                }
                Verb::Hangup => xml.push_str("<Hangup/>"),
            }
        }

        xml.push_str("</Response>");
        xml
    }

    /// Whether the document plays an audio resource.
    pub fn has_play(&self) -> bool {
        self.verbs.iter().any(|v| matches!(v, Verb::Play { .. }))
    }
}

impl IntoResponse for VoiceResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "text/xml")], self.to_xml()).into_response()
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;").replace('\'', "&apos;")
}
