//! The outbound text buffer of a pane.

use std::fmt;

use bithose_console_core::{Property, Signal};

use crate::error::FrameError;
use crate::frame::OutboundFrame;

/// Canned subscribe request.
pub const SUBSCRIBE_TEMPLATE: &str = concat!(
    "{ \n",
    "  \"type\": \"subscribe\",\n",
    "  \"criteria\": [\n",
    "    { \"operator\": \"==\", \"label_pair\": { \"name\": \"channel\", \"value\": \"cool_channel\" } },\n",
    "    { \"operator\": \">\", \"label_pair\": { \"name\": \"num_of_chars\", \"value\": 5 } }\n",
    "  ] \n",
    "}\n",
);

/// Canned message publish request.
pub const MESSAGE_TEMPLATE: &str = concat!(
    "{\n",
    "  \"type\": \"message\",\n",
    "  \"message\": {\n",
    "    \"body\": \"hello\",\n",
    "    \"label_pairs\": [\n",
    "      { \"name\": \"channel\", \"value\": \"cool_channel\" },\n",
    "      { \"name\": \"num_of_chars\", \"value\": 12 }\n",
    "    ]\n",
    "  }\n",
    "}\n",
);

/// A canned request that can be loaded into a composer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    /// [`SUBSCRIBE_TEMPLATE`]
    Subscribe,
    /// [`MESSAGE_TEMPLATE`]
    Message,
}

impl Preset {
    /// The exact template text.
    pub fn template(self) -> &'static str {
        match self {
            Self::Subscribe => SUBSCRIBE_TEMPLATE,
            Self::Message => MESSAGE_TEMPLATE,
        }
    }

    /// The preset's name, as typed in commands.
    pub fn name(self) -> &'static str {
        match self {
            Self::Subscribe => "subscribe",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Editable outbound text.
///
/// The buffer holds arbitrary text; nothing is validated until the owning
/// pane sends it.
pub struct PayloadComposer {
    text: Property<String>,
    /// Emitted with the new text whenever the buffer changes.
    pub text_changed: Signal<String>,
}

impl PayloadComposer {
    /// Create an empty composer.
    pub fn new() -> Self {
        Self {
            text: Property::new(String::new()),
            text_changed: Signal::new(),
        }
    }

    /// The current buffer.
    pub fn text(&self) -> String {
        self.text.get()
    }

    /// Replace the buffer.
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        if self.text.set(text.clone()) {
            self.text_changed.emit(text);
        }
    }

    /// Replace the buffer with a preset template.
    pub fn load_preset(&self, preset: Preset) {
        self.set_text(preset.template());
    }

    /// Replace the buffer with the pretty-printed encoding of `frame`.
    pub fn load_request<F: OutboundFrame>(&self, frame: &F) -> Result<(), FrameError> {
        self.set_text(frame.to_json_pretty()?);
        Ok(())
    }

    /// Empty the buffer.
    pub fn clear(&self) {
        self.set_text(String::new());
    }

    /// Returns `true` if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.text.with(String::is_empty)
    }
}

impl Default for PayloadComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PayloadComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadComposer")
            .field("text", &self.text)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::MessageRequest;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_templates_are_exact() {
        assert!(SUBSCRIBE_TEMPLATE.starts_with("{ \n  \"type\": \"subscribe\",\n"));
        assert!(SUBSCRIBE_TEMPLATE.ends_with("  ] \n}\n"));
        assert!(MESSAGE_TEMPLATE.starts_with("{\n  \"type\": \"message\",\n"));
        assert!(MESSAGE_TEMPLATE.ends_with("    ]\n  }\n}\n"));

        // Both presets are valid JSON as shipped.
        serde_json::from_str::<serde_json::Value>(SUBSCRIBE_TEMPLATE).unwrap();
        serde_json::from_str::<serde_json::Value>(MESSAGE_TEMPLATE).unwrap();
    }

    #[test]
    fn test_load_preset_replaces_buffer() {
        let composer = PayloadComposer::new();
        composer.set_text("{ partially typed");

        composer.load_preset(Preset::Subscribe);
        assert_eq!(composer.text(), SUBSCRIBE_TEMPLATE);

        composer.load_preset(Preset::Message);
        assert_eq!(composer.text(), MESSAGE_TEMPLATE);

        composer.load_preset(Preset::Subscribe);
        assert_eq!(composer.text(), SUBSCRIBE_TEMPLATE);
    }

    #[test]
    fn test_text_changed_only_on_change() {
        let composer = PayloadComposer::new();
        let changes = Arc::new(Mutex::new(Vec::new()));
        let changes_clone = changes.clone();
        composer.text_changed.connect(move |text| changes_clone.lock().push(text.clone()));

        composer.load_preset(Preset::Message);
        composer.load_preset(Preset::Message);
        composer.clear();

        assert_eq!(*changes.lock(), vec![MESSAGE_TEMPLATE.to_string(), String::new()]);
        assert!(composer.is_empty());
    }

    #[test]
    fn test_load_request() {
        let composer = PayloadComposer::new();
        composer
            .load_request(&MessageRequest::new("hi").label("channel", "cool_channel"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&composer.text()).unwrap();
        assert_eq!(value["message"]["body"], "hi");
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(Preset::Subscribe.name(), "subscribe");
        assert_eq!(Preset::Message.to_string(), "message");
    }
}
