// tc-core/src/units.rs

use uom::si::f64::{Length as UomLength, Volume as UomVolume};

// Public canonical unit types (f64)
pub type Length = UomLength;
pub type Volume = UomVolume;

/// US liquid gallons per cubic inch (1 gal = 231 in³).
pub const GALLONS_PER_CUBIC_INCH: f64 = 1.0 / 231.0;

#[inline]
pub fn inch(v: f64) -> Length {
    use uom::si::length::inch;
    Length::new::<inch>(v)
}

#[inline]
pub fn gallon(v: f64) -> Volume {
    use uom::si::volume::gallon;
    Volume::new::<gallon>(v)
}

#[inline]
pub fn to_inches(l: Length) -> f64 {
    use uom::si::length::inch;
    l.get::<inch>()
}

#[inline]
pub fn to_gallons(v: Volume) -> f64 {
    use uom::si::volume::gallon;
    v.get::<gallon>()
}
