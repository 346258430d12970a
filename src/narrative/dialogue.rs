// Transient dialogue line with an auto-dismiss deadline.
//
// Dismissal is a deadline checked every frame. Showing a new line overwrites
// the deadline, cancelling the previous dismissal.

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DialogueMessage {
    text: Option<String>,
    dismiss_at_ms: f64,
}

impl DialogueMessage {
    pub fn show(&mut self, text: &str, now_ms: f64, ttl_ms: f64) {
        self.text = Some(text.to_string());
        self.dismiss_at_ms = now_ms + ttl_ms;
    }

    pub fn clear(&mut self) {
        self.text = None;
    }

    /// Drop the line once its deadline has passed.
    pub fn expire(&mut self, now_ms: f64) {
        if self.text.is_some() && now_ms >= self.dismiss_at_ms {
            tracing::trace!("dialogue dismissed");
            self.text = None;
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.text.is_some()
    }
}
