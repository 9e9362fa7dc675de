use catppuccin::PALETTE;
use ratatui::style::Color;

/// Convert a catppuccin color to a ratatui color.
const fn catppuccin_to_color(c: &catppuccin::Color) -> Color {
    Color::Rgb(c.rgb.r, c.rgb.g, c.rgb.b)
}

/// Application colors.
///
/// Use the factory functions like `catppuccin_mocha()` for the built-in
/// flavors; components read colors through the accessor methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub base: Color,

    pub surface0: Color,
    pub surface1: Color,
    pub surface2: Color,

    pub overlay0: Color,
    pub overlay1: Color,

    pub text: Color,
    pub subtext0: Color,
    pub subtext1: Color,

    pub mauve: Color,
    pub red: Color,
    pub peach: Color,
    pub yellow: Color,
    pub green: Color,
    pub blue: Color,
    pub lavender: Color,
}

impl Theme {
    /// Create a theme from a Catppuccin flavor.
    const fn from_catppuccin(flavor: &catppuccin::Flavor) -> Self {
        let c = &flavor.colors;
        Self {
            base: catppuccin_to_color(&c.base),
            surface0: catppuccin_to_color(&c.surface0),
            surface1: catppuccin_to_color(&c.surface1),
            surface2: catppuccin_to_color(&c.surface2),
            overlay0: catppuccin_to_color(&c.overlay0),
            overlay1: catppuccin_to_color(&c.overlay1),
            text: catppuccin_to_color(&c.text),
            subtext0: catppuccin_to_color(&c.subtext0),
            subtext1: catppuccin_to_color(&c.subtext1),
            mauve: catppuccin_to_color(&c.mauve),
            red: catppuccin_to_color(&c.red),
            peach: catppuccin_to_color(&c.peach),
            yellow: catppuccin_to_color(&c.yellow),
            green: catppuccin_to_color(&c.green),
            blue: catppuccin_to_color(&c.blue),
            lavender: catppuccin_to_color(&c.lavender),
        }
    }

    /// Catppuccin Mocha theme (dark).
    #[must_use]
    pub fn catppuccin_mocha() -> Self {
        Self::from_catppuccin(&PALETTE.mocha)
    }

    /// Catppuccin Latte theme (light).
    #[must_use]
    pub fn catppuccin_latte() -> Self {
        Self::from_catppuccin(&PALETTE.latte)
    }

    /// Catppuccin Frappé theme (dark).
    #[must_use]
    pub fn catppuccin_frappe() -> Self {
        Self::from_catppuccin(&PALETTE.frappe)
    }

    /// Catppuccin Macchiato theme (dark).
    #[must_use]
    pub fn catppuccin_macchiato() -> Self {
        Self::from_catppuccin(&PALETTE.macchiato)
    }

    #[must_use]
    pub const fn base(&self) -> Color {
        self.base
    }

    #[must_use]
    pub const fn surface0(&self) -> Color {
        self.surface0
    }

    #[must_use]
    pub const fn surface1(&self) -> Color {
        self.surface1
    }

    #[must_use]
    pub const fn surface2(&self) -> Color {
        self.surface2
    }

    #[must_use]
    pub const fn overlay0(&self) -> Color {
        self.overlay0
    }

    #[must_use]
    pub const fn overlay1(&self) -> Color {
        self.overlay1
    }

    #[must_use]
    pub const fn text(&self) -> Color {
        self.text
    }

    #[must_use]
    pub const fn subtext0(&self) -> Color {
        self.subtext0
    }

    #[must_use]
    pub const fn subtext1(&self) -> Color {
        self.subtext1
    }

    #[must_use]
    pub const fn mauve(&self) -> Color {
        self.mauve
    }

    #[must_use]
    pub const fn red(&self) -> Color {
        self.red
    }

    #[must_use]
    pub const fn peach(&self) -> Color {
        self.peach
    }

    #[must_use]
    pub const fn yellow(&self) -> Color {
        self.yellow
    }

    #[must_use]
    pub const fn green(&self) -> Color {
        self.green
    }

    #[must_use]
    pub const fn blue(&self) -> Color {
        self.blue
    }

    #[must_use]
    pub const fn lavender(&self) -> Color {
        self.lavender
    }

    // UI element colors
    #[must_use]
    pub const fn border(&self) -> Color {
        self.surface1
    }

    #[must_use]
    pub const fn selection_bg(&self) -> Color {
        self.surface1
    }

    #[must_use]
    pub const fn header(&self) -> Color {
        self.yellow
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::catppuccin_mocha()
    }
}

/// Built-in themes by display name.
pub fn available_themes() -> [(&'static str, Theme); 4] {
    [
        ("Catppuccin Mocha", Theme::catppuccin_mocha()),
        ("Catppuccin Macchiato", Theme::catppuccin_macchiato()),
        ("Catppuccin Frappé", Theme::catppuccin_frappe()),
        ("Catppuccin Latte", Theme::catppuccin_latte()),
    ]
}

/// Look up a theme by name. Returns the default theme if not found.
pub fn theme_from_name(name: &str) -> Theme {
    available_themes()
        .into_iter()
        .find(|(theme_name, _)| theme_name.eq_ignore_ascii_case(name))
        .map(|(_, theme)| theme)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_lookup() {
        assert_eq!(theme_from_name("Catppuccin Latte"), Theme::catppuccin_latte());
        assert_eq!(theme_from_name("catppuccin latte"), Theme::catppuccin_latte());
        assert_eq!(theme_from_name("Solarized"), Theme::default());
    }
}
