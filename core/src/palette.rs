use serde::{Deserialize, Serialize};

/// Card colours derived from the site URL, so every site keeps its own tint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    hue: u16,
}

impl ColorScheme {
    pub fn from_url(url: &str) -> Self {
        let hash = url
            .encode_utf16()
            .fold(0i32, |hash, unit| {
                (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
            });
        Self {
            hue: (hash % 360).unsigned_abs() as u16,
        }
    }

    pub const fn hue(self) -> u16 {
        self.hue
    }

    fn hsl(self, saturation: u8, lightness: u8) -> String {
        format!("hsl({}, {}%, {}%)", self.hue, saturation, lightness)
    }

    pub fn primary(self) -> String {
        self.hsl(65, 50)
    }

    pub fn light(self) -> String {
        self.hsl(65, 65)
    }

    pub fn lighter(self) -> String {
        self.hsl(65, 75)
    }

    pub fn dark(self) -> String {
        self.hsl(65, 35)
    }

    pub fn darker(self) -> String {
        self.hsl(65, 25)
    }

    pub fn bg(self) -> String {
        self.hsl(35, 15)
    }

    pub fn text(self) -> String {
        self.hsl(65, 85)
    }

    /// `(name, value)` pairs for CSS custom properties, `--card-<name>`.
    pub fn css_vars(self) -> [(&'static str, String); 7] {
        [
            ("primary", self.primary()),
            ("light", self.light()),
            ("lighter", self.lighter()),
            ("dark", self.dark()),
            ("darker", self.darker()),
            ("bg", self.bg()),
            ("text", self.text()),
        ]
    }
}
