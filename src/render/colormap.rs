//! Named colour ramps and the multi-stop interpolation behind them.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::{Error, Result};

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::error::Error;
    use crate::render::colormap::{Colormap, Rgb};

    #[rstest]
    #[case("viridis", Colormap::Viridis)]
    #[case("YlOrRd", Colormap::YlOrRd)]
    #[case("RdYlGn", Colormap::RdYlGn)]
    #[case("terrain", Colormap::Terrain)]
    fn parses_matplotlib_names(#[case] name: &str, #[case] expected: Colormap) {
        assert_eq!(expected, name.parse().unwrap());
        assert_eq!(name, expected.name());
    }

    #[test]
    fn unknown_names_fail() {
        assert!(matches!("jet".parse::<Colormap>(), Err(Error::InvalidColormap(n)) if n == "jet"));
    }

    #[test]
    fn ramps_hit_their_end_stops() {
        assert_eq!(Rgb::new(0x44, 0x01, 0x54), Colormap::Viridis.evaluate(0.0));
        assert_eq!(Rgb::new(0xfd, 0xe7, 0x25), Colormap::Viridis.evaluate(1.0));
        assert_eq!(Rgb::new(0x80, 0x00, 0x26), Colormap::YlOrRd.evaluate(7.0));
        assert_eq!(Rgb::new(0xf7, 0xfb, 0xff), Colormap::Blues.evaluate(-1.0));
    }

    #[test]
    fn interpolates_between_stops() {
        // halfway between #440154 and #3b528b
        assert_eq!(Rgb::new(0x40, 0x2a, 0x70), Colormap::Viridis.evaluate(0.125));
    }

    #[rstest]
    #[case("black", Rgb::new(0, 0, 0))]
    #[case("white", Rgb::new(255, 255, 255))]
    #[case("#e41a1c", Rgb::new(0xe4, 0x1a, 0x1c))]
    #[case("#FFF", Rgb::new(255, 255, 255))]
    fn parses_colours(#[case] text: &str, #[case] expected: Rgb) {
        assert_eq!(expected, text.parse().unwrap());
        assert_eq!(expected, expected.to_hex().parse().unwrap());
    }

    #[test]
    fn rejects_bad_colours() {
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("chartreuse-ish".parse::<Rgb>().is_err());
    }
}

/// RGB colour with 8 bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    const fn hex(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = Error;

    /// `#rrggbb`, `#rgb` or one of a few CSS names.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Unsupported(format!("'{}' is not a colour", s));

        let named = match s.to_ascii_lowercase().as_str() {
            "black" | "k" => Some(Rgb::BLACK),
            "white" | "w" => Some(Rgb::WHITE),
            "red" | "r" => Some(Rgb::hex(0xff0000)),
            "green" | "g" => Some(Rgb::hex(0x008000)),
            "blue" | "b" => Some(Rgb::hex(0x0000ff)),
            "gray" | "grey" => Some(Rgb::hex(0x808080)),
            "orange" => Some(Rgb::hex(0xffa500)),
            "darkgreen" => Some(Rgb::hex(0x006400)),
            "steelblue" => Some(Rgb::hex(0x4682b4)),
            _ => None,
        };
        if let Some(rgb) = named {
            return Ok(rgb);
        }

        let digits = s.strip_prefix('#').ok_or_else(invalid)?;
        let value = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
        match digits.len() {
            6 => Ok(Rgb::hex(value)),
            3 => {
                let expand = |v: u32| ((v & 0xf) * 17) as u8;
                Ok(Rgb::new(expand(value >> 8), expand(value >> 4), expand(value)))
            }
            _ => Err(invalid()),
        }
    }
}

/// Named colour ramp, spelled like matplotlib's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Colormap {
    Viridis,
    Plasma,
    YlOrRd,
    Greens,
    Terrain,
    Blues,
    RdYlGn,
}

impl Colormap {
    pub const ALL: &'static [Colormap] = &[
        Self::Viridis,
        Self::Plasma,
        Self::YlOrRd,
        Self::Greens,
        Self::Terrain,
        Self::Blues,
        Self::RdYlGn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Viridis => "viridis",
            Self::Plasma => "plasma",
            Self::YlOrRd => "YlOrRd",
            Self::Greens => "Greens",
            Self::Terrain => "terrain",
            Self::Blues => "Blues",
            Self::RdYlGn => "RdYlGn",
        }
    }

    fn stops(&self) -> &'static [(f64, Rgb)] {
        match self {
            Self::Viridis => VIRIDIS_STOPS,
            Self::Plasma => PLASMA_STOPS,
            Self::YlOrRd => YLORRD_STOPS,
            Self::Greens => GREENS_STOPS,
            Self::Terrain => TERRAIN_STOPS,
            Self::Blues => BLUES_STOPS,
            Self::RdYlGn => RDYLGN_STOPS,
        }
    }

    /// Colour at normalised position `t`, clamped to [0, 1].
    pub fn evaluate(&self, t: f64) -> Rgb {
        multi_stop(self.stops(), t)
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Colormap::Viridis
    }
}

impl Display for Colormap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Colormap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Colormap::ALL
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or_else(|| Error::InvalidColormap(s.to_string()))
    }
}

const VIRIDIS_STOPS: &[(f64, Rgb)] = &[
    (0.00, Rgb::hex(0x440154)),
    (0.25, Rgb::hex(0x3b528b)),
    (0.50, Rgb::hex(0x21918c)),
    (0.75, Rgb::hex(0x5ec962)),
    (1.00, Rgb::hex(0xfde725)),
];

const PLASMA_STOPS: &[(f64, Rgb)] = &[
    (0.00, Rgb::hex(0x0d0887)),
    (0.25, Rgb::hex(0x7e03a8)),
    (0.50, Rgb::hex(0xcc4778)),
    (0.75, Rgb::hex(0xf89540)),
    (1.00, Rgb::hex(0xf0f921)),
];

const YLORRD_STOPS: &[(f64, Rgb)] = &[
    (0.000, Rgb::hex(0xffffcc)),
    (0.125, Rgb::hex(0xffeda0)),
    (0.250, Rgb::hex(0xfed976)),
    (0.375, Rgb::hex(0xfeb24c)),
    (0.500, Rgb::hex(0xfd8d3c)),
    (0.625, Rgb::hex(0xfc4e2a)),
    (0.750, Rgb::hex(0xe31a1c)),
    (0.875, Rgb::hex(0xbd0026)),
    (1.000, Rgb::hex(0x800026)),
];

const GREENS_STOPS: &[(f64, Rgb)] = &[
    (0.000, Rgb::hex(0xf7fcf5)),
    (0.125, Rgb::hex(0xe5f5e0)),
    (0.250, Rgb::hex(0xc7e9c0)),
    (0.375, Rgb::hex(0xa1d99b)),
    (0.500, Rgb::hex(0x74c476)),
    (0.625, Rgb::hex(0x41ab5d)),
    (0.750, Rgb::hex(0x238b45)),
    (0.875, Rgb::hex(0x006d2c)),
    (1.000, Rgb::hex(0x00441b)),
];

const BLUES_STOPS: &[(f64, Rgb)] = &[
    (0.000, Rgb::hex(0xf7fbff)),
    (0.125, Rgb::hex(0xdeebf7)),
    (0.250, Rgb::hex(0xc6dbef)),
    (0.375, Rgb::hex(0x9ecae1)),
    (0.500, Rgb::hex(0x6baed6)),
    (0.625, Rgb::hex(0x4292c6)),
    (0.750, Rgb::hex(0x2171b5)),
    (0.875, Rgb::hex(0x08519c)),
    (1.000, Rgb::hex(0x08306b)),
];

const TERRAIN_STOPS: &[(f64, Rgb)] = &[
    (0.00, Rgb::hex(0x333399)),
    (0.15, Rgb::hex(0x0099ff)),
    (0.25, Rgb::hex(0x00cc66)),
    (0.50, Rgb::hex(0xffff99)),
    (0.75, Rgb::hex(0x805c54)),
    (1.00, Rgb::hex(0xffffff)),
];

const RDYLGN_STOPS: &[(f64, Rgb)] = &[
    (0.0, Rgb::hex(0xa50026)),
    (0.1, Rgb::hex(0xd73027)),
    (0.2, Rgb::hex(0xf46d43)),
    (0.3, Rgb::hex(0xfdae61)),
    (0.4, Rgb::hex(0xfee08b)),
    (0.5, Rgb::hex(0xffffbf)),
    (0.6, Rgb::hex(0xd9ef8b)),
    (0.7, Rgb::hex(0xa6d96a)),
    (0.8, Rgb::hex(0x66bd63)),
    (0.9, Rgb::hex(0x1a9850)),
    (1.0, Rgb::hex(0x006837)),
];

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

fn multi_stop(stops: &[(f64, Rgb)], t: f64) -> Rgb {
    let (first, last) = (stops[0], stops[stops.len() - 1]);
    if !(t > 0.0) {
        return first.1;
    }
    if t >= 1.0 {
        return last.1;
    }

    for pair in stops.windows(2) {
        let ((t0, c0), (t1, c1)) = (pair[0], pair[1]);
        if t <= t1 {
            let ratio = (t - t0) / (t1 - t0);
            return Rgb::new(lerp(c0.r, c1.r, ratio), lerp(c0.g, c1.g, ratio), lerp(c0.b, c1.b, ratio));
        }
    }
    last.1
}
