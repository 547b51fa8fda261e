/// Colour class of the status line under the path input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Idle,
    Pending,
    Success,
    Error,
}

/// One-line load/save status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub tone: Tone,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            text: String::new(),
            tone: Tone::Idle,
        }
    }
}

impl Status {
    pub fn pending() -> Self {
        Self {
            text: "Loading...".to_owned(),
            tone: Tone::Pending,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Error,
        }
    }

    pub fn load_failed(reason: impl std::fmt::Display) -> Self {
        Self::error(format!("Loading failed: {reason}"))
    }

    pub fn frames_loaded(frames: usize, points_per_frame: usize) -> Self {
        Self::success(format!(
            "Successfully Loaded Point Cloud Data: {frames} Frames; {points_per_frame} Points Per Frame"
        ))
    }

    pub fn color(&self) -> egui::Color32 {
        match self.tone {
            Tone::Idle => egui::Color32::WHITE,
            Tone::Pending => egui::Color32::YELLOW,
            Tone::Success => egui::Color32::GREEN,
            Tone::Error => egui::Color32::RED,
        }
    }
}
