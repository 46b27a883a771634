/// Call-frame wrapping of a unit's primary script.
///
/// While a unit is compiled its context name is the active frame tag: every register
/// reference is prefixed with it, and the primary script body is bracketed by
/// `frame-summon` / `frame-kill`.

use crate::command::{render, Command};

#[derive(Debug, Default)]
pub struct CallFrame {
    tag: Option<String>,
}

impl CallFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, tag: &str) {
        self.tag = Some(tag.to_string());
    }

    pub fn exit(&mut self) {
        self.tag = None;
    }

    pub fn frame_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn owned_tag(&self) -> Option<String> {
        self.tag.clone()
    }

    pub fn summon(&self) -> Option<Command> {
        self.tag.as_ref().map(|tag| Command::FrameSummon(tag.clone()))
    }

    pub fn kill(&self) -> Option<Command> {
        self.tag.as_ref().map(|tag| Command::FrameKill(tag.clone()))
    }

    /// Render `body` bracketed by summon/kill. Without an active frame only the
    /// body is rendered.
    pub fn enter_script(&self, body: &[Command]) -> String {
        let mut script = String::new();
        if let Some(summon) = self.summon() {
            script.push_str(&render(&[summon]));
        }
        script.push_str(&render(body));
        if let Some(kill) = self.kill() {
            script.push_str(&render(&[kill]));
        }
        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_script_with_active_frame() {
        let mut frame = CallFrame::new();
        frame.enter("main");
        assert_eq!(frame.frame_tag(), Some("main"));
        let body = vec![Command::Invoke("main/f".to_string())];
        assert_eq!(frame.enter_script(&body), "frame-summon main\ninvoke main/f\nframe-kill main\n");
    }

    #[test]
    fn test_enter_script_without_frame() {
        let mut frame = CallFrame::new();
        frame.enter("main");
        frame.exit();
        assert!(frame.frame_tag().is_none());
        assert!(frame.summon().is_none());
        let body = vec![Command::Invoke("f".to_string())];
        assert_eq!(frame.enter_script(&body), "invoke f\n");
    }
}
