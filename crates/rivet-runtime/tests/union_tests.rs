//! Union-family dispatch through headers.

use std::sync::Arc;

use rivet_runtime::{
    AsInterface, FamilyMeta, HeaderLayout, HeaderMut, UnionError, UnionFamily, UnionHeader,
    UnionVariant,
};

trait Shape {
    fn area(&self) -> f32;
    fn scale(&mut self, factor: f32);
}

trait Projectile: Shape {
    fn speed(&self) -> f32;
}

#[repr(C)]
struct Circle {
    header: UnionHeader,
    radius: f32,
}

#[repr(C)]
struct Square {
    header: UnionHeader,
    side: f32,
}

#[repr(C)]
struct ProjectileHeader {
    root: UnionHeader,
    damage: u32,
}

unsafe impl HeaderLayout for ProjectileHeader {}

#[repr(C)]
struct Arrow {
    header: ProjectileHeader,
    speed: f32,
}

unsafe impl UnionVariant for Circle {
    type Header = UnionHeader;
    const TYPE_ID: u16 = 1;
    const NAME: &'static str = "Circle";
}

unsafe impl UnionVariant for Square {
    type Header = UnionHeader;
    const TYPE_ID: u16 = 2;
    const NAME: &'static str = "Square";
}

unsafe impl UnionVariant for Arrow {
    type Header = ProjectileHeader;
    const TYPE_ID: u16 = 3;
    const NAME: &'static str = "Arrow";
}

impl Shape for Circle {
    fn area(&self) -> f32 {
        3.0 * self.radius * self.radius
    }
    fn scale(&mut self, factor: f32) {
        self.radius *= factor;
    }
}

impl Shape for Square {
    fn area(&self) -> f32 {
        self.side * self.side
    }
    fn scale(&mut self, factor: f32) {
        self.side *= factor;
    }
}

impl Shape for Arrow {
    fn area(&self) -> f32 {
        0.0
    }
    fn scale(&mut self, _factor: f32) {}
}

impl Projectile for Arrow {
    fn speed(&self) -> f32 {
        self.speed
    }
}

macro_rules! as_interface {
    ($ty:ty => $iface:ident) => {
        impl AsInterface<dyn $iface> for $ty {
            fn as_interface(&self) -> &(dyn $iface + 'static) {
                self
            }
            fn as_interface_mut(&mut self) -> &mut (dyn $iface + 'static) {
                self
            }
        }
    };
}

as_interface!(Circle => Shape);
as_interface!(Square => Shape);
as_interface!(Arrow => Shape);
as_interface!(Arrow => Projectile);

fn shapes() -> UnionFamily<dyn Shape> {
    let mut family = UnionFamily::new("ShapeHeader");
    family
        .register::<Circle>()
        .and_then(|f| f.register::<Square>())
        .and_then(|f| f.register::<Arrow>())
        .unwrap();
    family
}

fn square(side: f32) -> Square {
    Square {
        header: UnionHeader::for_variant::<Square>(),
        side,
    }
}

#[test]
fn test_dispatch_reaches_the_stored_variant() {
    let family = shapes();
    let mut sq = square(2.0);
    {
        let mut header = HeaderMut::new(&mut sq);
        assert_eq!(header.id(), 2);
        assert_eq!(family.dispatch(&mut header).unwrap().area(), 4.0);
        family.dispatch(&mut header).unwrap().scale(3.0);
    }
    assert_eq!(sq.side, 6.0);
}

#[test]
fn test_metadata_for_known_and_unknown_ids() {
    let family = shapes();
    let mut sq = square(1.0);
    let mut header = HeaderMut::new(&mut sq);
    assert_eq!(family.type_name(header.header()), "Square");
    assert_eq!(family.size_of(header.header()), std::mem::size_of::<Square>() as i32);

    header.set_id(200);
    assert_eq!(family.type_name(header.header()), "Unknown (TypeID=200)");
    assert_eq!(family.size_of(header.header()), -1);
    let err = family.dispatch(&mut header).map(|_| ()).unwrap_err();
    assert_eq!(
        err,
        UnionError::UnknownTypeId {
            family: "ShapeHeader",
            type_id: 200
        }
    );
    assert_eq!(err.to_string(), "Unknown ShapeHeader.TypeIds value: 200");
}

#[test]
fn test_discriminant_that_disagrees_with_layout_is_rejected() {
    let family = shapes();
    let mut sq = square(1.0);
    let mut header = HeaderMut::new(&mut sq);
    header.set_id(Circle::TYPE_ID);
    let err = family.dispatch(&mut header).map(|_| ()).unwrap_err();
    assert!(matches!(err, UnionError::LayoutMismatch { variant: "Circle", .. }));
}

#[test]
fn test_try_as_matching_variant() {
    let family = shapes();
    let mut sq = square(5.0);
    let mut header = HeaderMut::new(&mut sq);
    let as_square = family.try_as::<Square>(&mut header).unwrap();
    as_square.side = 7.0;
    assert_eq!(sq.side, 7.0);
}

#[cfg(debug_assertions)]
#[test]
fn test_try_as_wrong_variant_names_both_sides() {
    let family = shapes();
    let mut sq = square(5.0);
    let mut header = HeaderMut::new(&mut sq);
    let err = family.try_as::<Circle>(&mut header).map(|_| ()).unwrap_err();
    assert_eq!(
        err,
        UnionError::VariantMismatch {
            family: "ShapeHeader",
            expected: "Circle",
            actual: "Square".to_string()
        }
    );
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "Invalid union cast in ShapeHeader: expected 'Circle', found 'Square'")]
fn test_as_variant_panics_on_mismatch_in_debug() {
    let family = shapes();
    let mut sq = square(5.0);
    let mut header = HeaderMut::new(&mut sq);
    family.as_variant::<Circle>(&mut header);
}

#[test]
fn test_nested_family_forwards_metadata_to_root() {
    let root = Arc::new(shapes());
    let mut projectiles: UnionFamily<dyn Projectile> =
        UnionFamily::nested("ProjectileHeader", root.clone());
    projectiles.register::<Arrow>().unwrap();

    let mut arrow = Arrow {
        header: ProjectileHeader {
            root: UnionHeader::for_variant::<Arrow>(),
            damage: 12,
        },
        speed: 30.0,
    };
    let mut header = HeaderMut::new(&mut arrow);

    assert_eq!(projectiles.type_name(header.header()), "Arrow");
    assert_eq!(projectiles.size_of(header.header()), std::mem::size_of::<Arrow>() as i32);
    assert!(projectiles.is_member(header.header()));
    assert_eq!(projectiles.dispatch(&mut header).unwrap().speed(), 30.0);

    let nested = root.as_header::<ProjectileHeader>(&mut header).unwrap();
    assert_eq!(nested.damage, 12);
    nested.damage = 20;
    assert_eq!(arrow.header.damage, 20);
}

#[test]
fn test_non_member_is_not_in_nested_family() {
    let root = Arc::new(shapes());
    let mut projectiles: UnionFamily<dyn Projectile> =
        UnionFamily::nested("ProjectileHeader", root.clone());
    projectiles.register::<Arrow>().unwrap();

    let mut sq = square(1.0);
    let mut header = HeaderMut::new(&mut sq);
    assert!(!projectiles.is_member(header.header()));
    let err = root
        .as_header::<ProjectileHeader>(&mut header)
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, UnionError::LayoutMismatch { .. }));
}
