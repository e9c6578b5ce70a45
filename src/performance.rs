use ratatui::style::Color;

/// Finish-screen verdict for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Performance {
    Excellent,
    #[strum(serialize = "Very good")]
    VeryGood,
    Good,
    #[strum(serialize = "Needs practice")]
    NeedsPractice,
}

impl Performance {
    pub fn for_percentage(percentage: u8) -> Self {
        match percentage {
            85.. => Performance::Excellent,
            70..=84 => Performance::VeryGood,
            60..=69 => Performance::Good,
            _ => Performance::NeedsPractice,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Performance::Excellent => "Excellent! A great performance.",
            Performance::VeryGood => "Very good! A successful quiz.",
            Performance::Good => "Good, but a little more study would help.",
            Performance::NeedsPractice => "You need more practice.",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Performance::Excellent => Color::Yellow,
            Performance::VeryGood => Color::Green,
            Performance::Good => Color::Blue,
            Performance::NeedsPractice => Color::Red,
        }
    }
}

/// Coarser grading used for history rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Ok,
    Bad,
}

impl ScoreBand {
    pub fn for_percentage(percentage: u8) -> Self {
        match percentage {
            70.. => ScoreBand::Good,
            50..=69 => ScoreBand::Ok,
            _ => ScoreBand::Bad,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            ScoreBand::Good => Color::Green,
            ScoreBand::Ok => Color::Yellow,
            ScoreBand::Bad => Color::Red,
        }
    }
}
