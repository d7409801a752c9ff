#![forbid(unsafe_code)]

//! Floor entities: tables and decorative elements.
//!
//! Entity lists are owned by the host and handed in on every frame. Nothing
//! in this crate mutates them; the types here only describe geometry and the
//! status that drives fill colour.
//!
//! # Invalid geometry
//!
//! An entity whose numbers are not finite, or whose width/height is not
//! positive, has no [`ResolvedGeometry`]. Such entities are skipped by layout,
//! fit, and hit-testing without raising an error.

use crate::geometry::{Bounds, Canvas, Point};

/// Stable identifier of a table, decorative element, or reservation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outline of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Shape {
    Rectangle,
    Square,
    Circle,
    Oval,
    Bar,
    Wall,
    Divider,
    Column,
    Plant,
    Label,
    ZoneMarker,
}

impl Shape {
    /// Seatable shapes. Everything else is decoration.
    #[inline]
    #[must_use]
    pub const fn is_table(self) -> bool {
        matches!(
            self,
            Self::Rectangle | Self::Square | Self::Circle | Self::Oval | Self::Bar
        )
    }

    /// Point-in-shape test in entity-local, unrotated coordinates.
    #[must_use]
    pub fn contains_local(self, local: Point, half_w: f64, half_h: f64) -> bool {
        match self {
            Self::Circle | Self::Column | Self::Plant => {
                local.x * local.x + local.y * local.y <= half_w * half_w
            }
            Self::Oval => {
                (local.x * local.x) / (half_w * half_w) + (local.y * local.y) / (half_h * half_h)
                    <= 1.0
            }
            Self::Rectangle
            | Self::Square
            | Self::Bar
            | Self::Wall
            | Self::Divider
            | Self::Label
            | Self::ZoneMarker => local.x.abs() <= half_w && local.y.abs() <= half_h,
        }
    }
}

/// Seating status; drives the fill colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StatusCategory {
    #[default]
    Available,
    Reserved,
    Seated,
    Ordered,
    Dessert,
    Check,
    Dirty,
    Blocked,
}

impl StatusCategory {
    /// Fill colour as packed `0xRRGGBBAA`.
    #[must_use]
    pub const fn fill(self) -> Rgba {
        match self {
            Self::Available => Rgba(0xE8F5E9FF),
            Self::Reserved => Rgba(0xE3F2FDFF),
            Self::Seated => Rgba(0xFFF3E0FF),
            Self::Ordered => Rgba(0xFFE0B2FF),
            Self::Dessert => Rgba(0xF3E5F5FF),
            Self::Check => Rgba(0xFFFDE7FF),
            Self::Dirty => Rgba(0xEFEBE9FF),
            Self::Blocked => Rgba(0xEEEEEEFF),
        }
    }

    /// Whether a party currently occupies the table.
    #[must_use]
    pub const fn is_occupied(self) -> bool {
        matches!(self, Self::Seated | Self::Ordered | Self::Dessert | Self::Check)
    }
}

/// A packed `0xRRGGBBAA` colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba(pub u32);

impl Rgba {
    pub const TRANSPARENT: Self = Self(0x0000_0000);

    #[must_use]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[must_use]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[must_use]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[must_use]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }
}

/// The party currently sitting at a table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Occupant {
    /// Unix epoch milliseconds when the party was seated.
    pub seated_at_ms: i64,
    pub party_size: u32,
    pub label: String,
}

/// A table or decorative element placed on the floor plan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionedEntity {
    pub id: EntityId,
    pub shape: Shape,
    /// Center as a percentage (0–100) of the canvas.
    pub center_percent: Point,
    /// Width in content units.
    pub width: f64,
    /// Height in content units.
    pub height: f64,
    /// Rotation in degrees, clockwise.
    pub rotation: f64,
    pub z_index: i32,
    pub status: StatusCategory,
    pub occupant: Option<Occupant>,
    /// Colour of the assigned server's section, if any.
    pub server_color: Option<Rgba>,
}

impl PositionedEntity {
    /// A table with default status and no rotation.
    #[must_use]
    pub fn table(id: u64, shape: Shape, center_percent: Point, width: f64, height: f64) -> Self {
        Self {
            id: EntityId(id),
            shape,
            center_percent,
            width,
            height,
            rotation: 0.0,
            z_index: 0,
            status: StatusCategory::Available,
            occupant: None,
            server_color: None,
        }
    }

    #[must_use]
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    #[must_use]
    pub fn with_z_index(mut self, z: i32) -> Self {
        self.z_index = z;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCategory) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_occupant(mut self, occupant: Occupant) -> Self {
        self.occupant = Some(occupant);
        self
    }

    #[inline]
    #[must_use]
    pub fn is_table(&self) -> bool {
        self.shape.is_table()
    }

    /// Resolve to content space, or `None` if the geometry is unusable.
    #[must_use]
    pub fn geometry(&self, canvas: &Canvas) -> Option<ResolvedGeometry> {
        if !(self.width > 0.0 && self.height > 0.0)
            || !self.width.is_finite()
            || !self.height.is_finite()
            || !self.rotation.is_finite()
            || !self.center_percent.is_finite()
        {
            return None;
        }
        let center = canvas.resolve(self.center_percent);
        if !center.is_finite() {
            return None;
        }
        Some(ResolvedGeometry {
            center,
            half_w: self.width * 0.5,
            half_h: self.height * 0.5,
            rotation: self.rotation,
        })
    }
}

/// Entity geometry in content space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedGeometry {
    pub center: Point,
    pub half_w: f64,
    pub half_h: f64,
    pub rotation: f64,
}

impl ResolvedGeometry {
    /// Unrotated bounding box. Rotation is deliberately ignored.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::around(self.center, self.half_w, self.half_h)
    }

    /// Half of the box diagonal; no point of the shape lies farther from
    /// the center, whatever the rotation.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.half_w.hypot(self.half_h)
    }

    /// Map a content-space point into entity-local, unrotated space.
    #[inline]
    #[must_use]
    pub fn to_local(&self, content: Point) -> Point {
        (content - self.center).rotated(-self.rotation)
    }

    /// Shape test for a content-space point.
    #[must_use]
    pub fn contains(&self, shape: Shape, content: Point) -> bool {
        shape.contains_local(self.to_local(content), self.half_w, self.half_h)
    }
}
