//! Visual encoding record produced by every formula.

use serde::{Deserialize, Serialize};

/// Shape category of an encoding.
///
/// Order matters: numerological digit roots 1-9 index this list directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeType {
    Circle,
    Triangle,
    Square,
    Pentagon,
    Hexagon,
    Star,
    Spiral,
    Polygon,
    Fractal,
}

impl ShapeType {
    pub const ALL: [ShapeType; 9] = [
        ShapeType::Circle,
        ShapeType::Triangle,
        ShapeType::Square,
        ShapeType::Pentagon,
        ShapeType::Hexagon,
        ShapeType::Star,
        ShapeType::Spiral,
        ShapeType::Polygon,
        ShapeType::Fractal,
    ];

    /// Shape for a digit root in 1..=9 (values outside are clamped).
    pub fn from_digit_root(root: u32) -> Self {
        let idx = root.clamp(1, 9) as usize - 1;
        Self::ALL[idx]
    }

    /// Shape with the given number of sides, for polygon-counting formulas.
    pub fn from_sides(sides: u32) -> Self {
        match sides {
            0 => ShapeType::Circle,
            1..=3 => ShapeType::Triangle,
            4 => ShapeType::Square,
            5 => ShapeType::Pentagon,
            6 => ShapeType::Hexagon,
            _ => ShapeType::Polygon,
        }
    }
}

/// Color palette category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaletteCategory {
    Warm,
    Cool,
    Earth,
    Jewel,
    Pastel,
    Neon,
    Monochrome,
}

impl PaletteCategory {
    /// Classify a bounded HSB color.
    pub fn from_color(hue: f64, saturation: f64, brightness: f64) -> Self {
        let warm = !(90.0..300.0).contains(&hue);
        if saturation < 15.0 {
            PaletteCategory::Monochrome
        } else if brightness > 80.0 && saturation < 50.0 {
            PaletteCategory::Pastel
        } else if saturation > 85.0 && brightness > 70.0 {
            PaletteCategory::Neon
        } else if brightness < 45.0 {
            if warm {
                PaletteCategory::Earth
            } else {
                PaletteCategory::Jewel
            }
        } else if warm {
            PaletteCategory::Warm
        } else {
            PaletteCategory::Cool
        }
    }
}

/// Numeric properties of an encoding that are correlated against outcomes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum VisualProperty {
    Complexity,
    Symmetry,
    AngularVsCurved,
    Hue,
    Saturation,
    Brightness,
    X,
    Y,
    Z,
    Rotation,
    GlowIntensity,
    PatternDensity,
    FractalDimension,
}

impl VisualProperty {
    pub const ALL: [VisualProperty; 13] = [
        VisualProperty::Complexity,
        VisualProperty::Symmetry,
        VisualProperty::AngularVsCurved,
        VisualProperty::Hue,
        VisualProperty::Saturation,
        VisualProperty::Brightness,
        VisualProperty::X,
        VisualProperty::Y,
        VisualProperty::Z,
        VisualProperty::Rotation,
        VisualProperty::GlowIntensity,
        VisualProperty::PatternDensity,
        VisualProperty::FractalDimension,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VisualProperty::Complexity => "complexity",
            VisualProperty::Symmetry => "symmetry",
            VisualProperty::AngularVsCurved => "angular_vs_curved",
            VisualProperty::Hue => "hue",
            VisualProperty::Saturation => "saturation",
            VisualProperty::Brightness => "brightness",
            VisualProperty::X => "x",
            VisualProperty::Y => "y",
            VisualProperty::Z => "z",
            VisualProperty::Rotation => "rotation",
            VisualProperty::GlowIntensity => "glow_intensity",
            VisualProperty::PatternDensity => "pattern_density",
            VisualProperty::FractalDimension => "fractal_dimension",
        }
    }

    /// Documented range. Upper bound is exclusive for wrapped angles.
    pub fn range(self) -> (f64, f64) {
        match self {
            VisualProperty::Complexity
            | VisualProperty::Symmetry
            | VisualProperty::Z
            | VisualProperty::GlowIntensity
            | VisualProperty::PatternDensity => (0.0, 1.0),
            VisualProperty::AngularVsCurved | VisualProperty::X | VisualProperty::Y => (-1.0, 1.0),
            VisualProperty::Hue | VisualProperty::Rotation => (0.0, 360.0),
            VisualProperty::Saturation | VisualProperty::Brightness => (0.0, 100.0),
            VisualProperty::FractalDimension => (1.0, 2.0),
        }
    }

    /// Whether the property wraps around its range instead of clipping.
    pub fn is_angle(self) -> bool {
        matches!(self, VisualProperty::Hue | VisualProperty::Rotation)
    }

    /// Bring a raw value into range. Non-finite values map to the floor.
    pub fn bound(self, value: f64) -> f64 {
        let (lo, hi) = self.range();
        if !value.is_finite() {
            return lo;
        }
        if self.is_angle() {
            let wrapped = value.rem_euclid(hi);
            // rem_euclid can round up to the modulus for tiny negatives.
            if wrapped >= hi { 0.0 } else { wrapped }
        } else {
            value.clamp(lo, hi)
        }
    }
}

/// Unbounded visual fields as computed by a formula, before range enforcement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawVisual {
    pub shape_type: ShapeType,
    /// Explicit palette; derived from the bounded color when `None`.
    pub palette: Option<PaletteCategory>,
    pub complexity: f64,
    pub symmetry: f64,
    pub angular_vs_curved: f64,
    pub hue: f64,
    pub saturation: f64,
    pub brightness: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rotation: f64,
    pub glow_intensity: f64,
    pub pattern_density: f64,
    pub fractal_dimension: f64,
}

/// Deterministic transformation output for one name under one formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualEncoding {
    pub shape_type: ShapeType,
    /// Visual complexity (0-1).
    pub complexity: f64,
    /// Symmetry (0-1).
    pub symmetry: f64,
    /// -1 fully curved, +1 fully angular.
    pub angular_vs_curved: f64,
    /// Hue in degrees, [0, 360).
    pub hue: f64,
    /// Saturation (0-100).
    pub saturation: f64,
    /// Brightness (0-100).
    pub brightness: f64,
    pub palette: PaletteCategory,
    /// Horizontal position (-1 to 1).
    pub x: f64,
    /// Vertical position (-1 to 1).
    pub y: f64,
    /// Depth (0-1).
    pub z: f64,
    /// Rotation in degrees, [0, 360).
    pub rotation: f64,
    /// Glow (0-1).
    pub glow_intensity: f64,
    /// Texture density (0-1).
    pub pattern_density: f64,
    /// Fractal dimension (1-2).
    pub fractal_dimension: f64,
    /// Name that was encoded.
    pub name: String,
    /// Formula that produced this encoding.
    pub formula_id: String,
    /// Opaque payload owned by downstream collaborators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl VisualEncoding {
    /// Enforce documented ranges on raw formula output.
    pub fn bounded(raw: RawVisual, name: &str, formula_id: &str) -> Self {
        let hue = VisualProperty::Hue.bound(raw.hue);
        let saturation = VisualProperty::Saturation.bound(raw.saturation);
        let brightness = VisualProperty::Brightness.bound(raw.brightness);
        let palette = raw
            .palette
            .unwrap_or_else(|| PaletteCategory::from_color(hue, saturation, brightness));

        Self {
            shape_type: raw.shape_type,
            complexity: VisualProperty::Complexity.bound(raw.complexity),
            symmetry: VisualProperty::Symmetry.bound(raw.symmetry),
            angular_vs_curved: VisualProperty::AngularVsCurved.bound(raw.angular_vs_curved),
            hue,
            saturation,
            brightness,
            palette,
            x: VisualProperty::X.bound(raw.x),
            y: VisualProperty::Y.bound(raw.y),
            z: VisualProperty::Z.bound(raw.z),
            rotation: VisualProperty::Rotation.bound(raw.rotation),
            glow_intensity: VisualProperty::GlowIntensity.bound(raw.glow_intensity),
            pattern_density: VisualProperty::PatternDensity.bound(raw.pattern_density),
            fractal_dimension: VisualProperty::FractalDimension.bound(raw.fractal_dimension),
            name: name.to_string(),
            formula_id: formula_id.to_string(),
            payload: None,
        }
    }

    /// Attach an opaque payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Read a numeric property.
    pub fn property(&self, property: VisualProperty) -> f64 {
        match property {
            VisualProperty::Complexity => self.complexity,
            VisualProperty::Symmetry => self.symmetry,
            VisualProperty::AngularVsCurved => self.angular_vs_curved,
            VisualProperty::Hue => self.hue,
            VisualProperty::Saturation => self.saturation,
            VisualProperty::Brightness => self.brightness,
            VisualProperty::X => self.x,
            VisualProperty::Y => self.y,
            VisualProperty::Z => self.z,
            VisualProperty::Rotation => self.rotation,
            VisualProperty::GlowIntensity => self.glow_intensity,
            VisualProperty::PatternDensity => self.pattern_density,
            VisualProperty::FractalDimension => self.fractal_dimension,
        }
    }

    /// Check every numeric field against its documented range.
    pub fn is_within_bounds(&self) -> bool {
        VisualProperty::ALL.iter().all(|&p| {
            let v = self.property(p);
            let (lo, hi) = p.range();
            if p.is_angle() {
                v >= lo && v < hi
            } else {
                v >= lo && v <= hi
            }
        })
    }
}
