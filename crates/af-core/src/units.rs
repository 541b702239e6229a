//! SI quantities for the physical models. Geometry is authored in mm and g; the closed-form
//! formulas take plain SI base values through the extractors below.

use uom::si::f64::{
    Acceleration as UomAcceleration, Area as UomArea, Force as UomForce, Length as UomLength,
    Mass as UomMass, MassDensity as UomMassDensity, Pressure as UomPressure,
    Velocity as UomVelocity,
};

pub type Accel = UomAcceleration;
pub type Area = UomArea;
pub type Density = UomMassDensity;
pub type Force = UomForce;
pub type Length = UomLength;
pub type Mass = UomMass;
pub type Pressure = UomPressure;
pub type Velocity = UomVelocity;

#[inline]
pub fn mm(v: f64) -> Length {
    use uom::si::length::millimeter;
    Length::new::<millimeter>(v)
}

#[inline]
pub fn mm2(v: f64) -> Area {
    use uom::si::area::square_millimeter;
    Area::new::<square_millimeter>(v)
}

#[inline]
pub fn grams(v: f64) -> Mass {
    use uom::si::mass::gram;
    Mass::new::<gram>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

/// Value in SI base units (m, kg, m², N, ...), for closed-form formulas.
#[inline]
pub fn mass_kg(mass: Mass) -> f64 {
    use uom::si::mass::kilogram;
    mass.get::<kilogram>()
}

#[inline]
pub fn area_m2(a: Area) -> f64 {
    use uom::si::area::square_meter;
    a.get::<square_meter>()
}

#[inline]
pub fn force_n(f: Force) -> f64 {
    use uom::si::force::newton;
    f.get::<newton>()
}

#[inline]
pub fn pressure_pa(p: Pressure) -> f64 {
    use uom::si::pressure::pascal;
    p.get::<pascal>()
}

pub mod constants {
    use super::*;

    pub const G0_MPS2: f64 = 9.806_65;
    pub const AIR_DENSITY_KG_M3: f64 = 1.225;

    #[inline]
    pub fn g0() -> Accel {
        use uom::si::acceleration::meter_per_second_squared;
        Accel::new::<meter_per_second_squared>(G0_MPS2)
    }

    #[inline]
    pub fn sea_level_air() -> Density {
        kg_per_m3(AIR_DENSITY_KG_M3)
    }
}
