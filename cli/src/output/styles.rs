//! Terminal stylesheet.

use owo_colors::Style;

/// Styles used by every renderer. [`Styles::plain`] leaves text untouched.
#[derive(Default, Clone, Copy)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    pub dim: Style,
    pub bold: Style,
    pub header: Style,
    /// Stack names in plans and deploy reports.
    pub stack: Style,
    /// Anything reachable from the internet: public subnets, the balancer URL.
    pub public: Style,
}

impl Styles {
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn colored() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            info: Style::new().blue(),
            dim: Style::new().dimmed(),
            bold: Style::new().bold(),
            header: Style::new().bold().cyan(),
            stack: Style::new().truecolor(26, 107, 160),
            public: Style::new().truecolor(214, 120, 38),
        }
    }
}
