//! Union-family dispatch and reinterpretation.
//!
//! A union family is a set of `#[repr(C)]` variant structs that all begin
//! with a [`UnionHeader`] (directly, or through a nested header struct that
//! itself begins with one). The header stores the variant's type id. A
//! [`UnionFamily`] is the per-family call table: given a header it finds the
//! variant entry for the stored id and reinterprets the value as that variant
//! or as the family's interface.
//!
//! Headers are accessed through [`HeaderMut`], which can only be created from
//! a real variant value. It remembers which variant type it was created from,
//! so a discriminant that disagrees with the actual layout is reported as an
//! error instead of producing an invalid reference.

use std::any::TypeId;
use std::borrow::Cow;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::error::UnionError;

/// Common prefix of every union value.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UnionHeader {
    /// Variant discriminant. 0 means "unset".
    pub type_id: u16,
}

impl UnionHeader {
    /// Header for a freshly constructed variant.
    pub const fn for_variant<V: UnionVariant>() -> Self {
        Self {
            type_id: V::TYPE_ID,
        }
    }
}

/// A struct whose first field places a [`UnionHeader`] at offset 0.
///
/// # Safety
///
/// The implementing type must be `#[repr(C)]` and its first field must be a
/// `UnionHeader` or another `HeaderLayout` type.
pub unsafe trait HeaderLayout: Sized + 'static {}

// SAFETY: trivially starts with itself.
unsafe impl HeaderLayout for UnionHeader {}

/// A member of a union family.
///
/// # Safety
///
/// The implementing type must be `#[repr(C)]` and its first field must be of
/// type `Self::Header`.
pub unsafe trait UnionVariant: Sized + 'static {
    /// The header struct at offset 0 of this variant.
    type Header: HeaderLayout;
    /// Unique non-zero id within the family.
    const TYPE_ID: u16;
    /// Variant name used in diagnostics.
    const NAME: &'static str;
}

/// Borrow a variant as the family interface.
///
/// Implementations are normally just `self`.
pub trait AsInterface<I: ?Sized> {
    /// Shared borrow as the interface.
    fn as_interface(&self) -> &I;
    /// Exclusive borrow as the interface.
    fn as_interface_mut(&mut self) -> &mut I;
}

/// Exclusive access to the header of a union value.
pub struct HeaderMut<'a> {
    ptr: NonNull<UnionHeader>,
    origin: TypeId,
    _marker: PhantomData<&'a mut UnionHeader>,
}

impl<'a> HeaderMut<'a> {
    /// Take the header of `value`.
    pub fn new<V: UnionVariant>(value: &'a mut V) -> Self {
        Self {
            ptr: NonNull::from(value).cast(),
            origin: TypeId::of::<V>(),
            _marker: PhantomData,
        }
    }

    /// The header fields.
    pub fn header(&self) -> &UnionHeader {
        // SAFETY: `ptr` came from a live `&'a mut V` whose first bytes are a UnionHeader.
        unsafe { self.ptr.as_ref() }
    }

    /// The stored type id.
    pub fn id(&self) -> u16 {
        self.header().type_id
    }

    /// Overwrite the stored type id.
    pub fn set_id(&mut self, type_id: u16) {
        // SAFETY: see `header`; the borrow is exclusive.
        unsafe { self.ptr.as_mut().type_id = type_id }
    }
}

/// Metadata queries shared by root and nested families.
pub trait FamilyMeta: Send + Sync {
    /// Family (header) name.
    fn family_name(&self) -> &'static str;
    /// Variant name for the header's id, or `Unknown (TypeID=n)`.
    fn type_name(&self, header: &UnionHeader) -> Cow<'static, str>;
    /// Variant size in bytes for the header's id, or -1.
    fn size_of(&self, header: &UnionHeader) -> i32;
    /// Whether the id belongs to this family.
    fn contains(&self, type_id: u16) -> bool;
}

struct VariantEntry<I: ?Sized> {
    type_id: u16,
    name: &'static str,
    size: usize,
    layout: TypeId,
    header_layout: TypeId,
    cast_ref: unsafe fn(NonNull<UnionHeader>) -> *const I,
    cast_mut: unsafe fn(NonNull<UnionHeader>) -> *mut I,
}

unsafe fn cast_ref<V, I>(ptr: NonNull<UnionHeader>) -> *const I
where
    V: UnionVariant + AsInterface<I>,
    I: ?Sized,
{
    // SAFETY: caller checked that `ptr` was created from a `V`.
    let value = unsafe { &*ptr.cast::<V>().as_ptr() };
    value.as_interface() as *const I
}

unsafe fn cast_mut<V, I>(ptr: NonNull<UnionHeader>) -> *mut I
where
    V: UnionVariant + AsInterface<I>,
    I: ?Sized,
{
    // SAFETY: caller checked that `ptr` was created from a `V`.
    let value = unsafe { &mut *ptr.cast::<V>().as_ptr() };
    value.as_interface_mut() as *mut I
}

/// Dispatch table of one union family, sorted by type id.
pub struct UnionFamily<I: ?Sized + 'static> {
    name: &'static str,
    variants: Vec<VariantEntry<I>>,
    parent: Option<Arc<dyn FamilyMeta>>,
}

impl<I: ?Sized + 'static> UnionFamily<I> {
    /// Create an empty root family named after its header type.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            variants: Vec::new(),
            parent: None,
        }
    }

    /// Create a nested family whose metadata queries forward to `parent`.
    pub fn nested(name: &'static str, parent: Arc<dyn FamilyMeta>) -> Self {
        Self {
            name,
            variants: Vec::new(),
            parent: Some(parent),
        }
    }

    /// Add a variant to the table.
    pub fn register<V>(&mut self) -> Result<&mut Self, UnionError>
    where
        V: UnionVariant + AsInterface<I>,
    {
        if V::TYPE_ID == 0 {
            return Err(UnionError::ReservedTypeId {
                family: self.name,
                variant: V::NAME,
            });
        }
        match self.variants.binary_search_by_key(&V::TYPE_ID, |e| e.type_id) {
            Ok(index) => Err(UnionError::DuplicateTypeId {
                family: self.name,
                type_id: V::TYPE_ID,
                first: self.variants[index].name,
                second: V::NAME,
            }),
            Err(index) => {
                self.variants.insert(
                    index,
                    VariantEntry {
                        type_id: V::TYPE_ID,
                        name: V::NAME,
                        size: std::mem::size_of::<V>(),
                        layout: TypeId::of::<V>(),
                        header_layout: TypeId::of::<V::Header>(),
                        cast_ref: cast_ref::<V, I>,
                        cast_mut: cast_mut::<V, I>,
                    },
                );
                Ok(self)
            }
        }
    }

    /// Number of registered variants.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Check if no variant is registered.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    fn entry(&self, type_id: u16) -> Option<&VariantEntry<I>> {
        self.variants
            .binary_search_by_key(&type_id, |e| e.type_id)
            .ok()
            .map(|index| &self.variants[index])
    }

    fn checked_entry(&self, header: &HeaderMut<'_>) -> Result<&VariantEntry<I>, UnionError> {
        let type_id = header.id();
        let entry = self.entry(type_id).ok_or(UnionError::UnknownTypeId {
            family: self.name,
            type_id,
        })?;
        if entry.layout != header.origin {
            return Err(UnionError::LayoutMismatch {
                family: self.name,
                type_id,
                variant: entry.name,
            });
        }
        Ok(entry)
    }

    /// Borrow the value as the family interface, selected by the stored id.
    pub fn dispatch<'h>(&self, header: &'h mut HeaderMut<'_>) -> Result<&'h mut I, UnionError> {
        let entry = self.checked_entry(header)?;
        // SAFETY: the entry's layout matches the value the header was created from.
        Ok(unsafe { &mut *(entry.cast_mut)(header.ptr) })
    }

    /// Shared variant of [`dispatch`](Self::dispatch).
    pub fn dispatch_ref<'h>(&self, header: &'h HeaderMut<'_>) -> Result<&'h I, UnionError> {
        let entry = self.checked_entry(header)?;
        // SAFETY: as in `dispatch`.
        Ok(unsafe { &*(entry.cast_ref)(header.ptr) })
    }

    /// Reinterpret the value as variant `V`.
    ///
    /// With debug assertions enabled the stored id is compared against
    /// `V::TYPE_ID` first and a mismatch names both variants. The layout
    /// check always runs.
    pub fn try_as<'h, V: UnionVariant>(
        &self,
        header: &'h mut HeaderMut<'_>,
    ) -> Result<&'h mut V, UnionError> {
        if cfg!(debug_assertions) && header.id() != V::TYPE_ID {
            return Err(UnionError::VariantMismatch {
                family: self.name,
                expected: V::NAME,
                actual: self.type_name(header.header()).into_owned(),
            });
        }
        if header.origin != TypeId::of::<V>() {
            return Err(UnionError::LayoutMismatch {
                family: self.name,
                type_id: header.id(),
                variant: V::NAME,
            });
        }
        // SAFETY: the header was created from a `V`.
        Ok(unsafe { &mut *header.ptr.cast::<V>().as_ptr() })
    }

    /// Like [`try_as`](Self::try_as) but panics on mismatch.
    pub fn as_variant<'h, V: UnionVariant>(&self, header: &'h mut HeaderMut<'_>) -> &'h mut V {
        match self.try_as::<V>(header) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Whether the stored id belongs to this family (the nested-family predicate).
    pub fn is_member(&self, header: &UnionHeader) -> bool {
        self.entry(header.type_id).is_some()
    }

    /// Reinterpret the value as the nested header `N` shared by this family's variants.
    pub fn as_header<'h, N: HeaderLayout>(
        &self,
        header: &'h mut HeaderMut<'_>,
    ) -> Result<&'h mut N, UnionError> {
        let type_id = header.id();
        let entry = self.entry(type_id).ok_or(UnionError::NotInFamily {
            family: self.name,
            type_id,
        })?;
        if entry.layout != header.origin || entry.header_layout != TypeId::of::<N>() {
            return Err(UnionError::LayoutMismatch {
                family: self.name,
                type_id,
                variant: entry.name,
            });
        }
        // SAFETY: the value is an `entry` variant whose first field is an `N`.
        Ok(unsafe { &mut *header.ptr.cast::<N>().as_ptr() })
    }

    fn own_type_name(&self, header: &UnionHeader) -> Cow<'static, str> {
        match self.entry(header.type_id) {
            Some(entry) => Cow::Borrowed(entry.name),
            None => Cow::Owned(format!("Unknown (TypeID={})", header.type_id)),
        }
    }

    fn own_size_of(&self, header: &UnionHeader) -> i32 {
        self.entry(header.type_id)
            .map(|entry| entry.size as i32)
            .unwrap_or(-1)
    }
}

impl<I: ?Sized + 'static> FamilyMeta for UnionFamily<I> {
    fn family_name(&self) -> &'static str {
        self.name
    }

    fn type_name(&self, header: &UnionHeader) -> Cow<'static, str> {
        match &self.parent {
            Some(parent) => parent.type_name(header),
            None => self.own_type_name(header),
        }
    }

    fn size_of(&self, header: &UnionHeader) -> i32 {
        match &self.parent {
            Some(parent) => parent.size_of(header),
            None => self.own_size_of(header),
        }
    }

    fn contains(&self, type_id: u16) -> bool {
        self.entry(type_id).is_some()
    }
}

impl<I: ?Sized + 'static> std::fmt::Debug for UnionFamily<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionFamily")
            .field("name", &self.name)
            .field(
                "variants",
                &self.variants.iter().map(|e| (e.type_id, e.name)).collect::<Vec<_>>(),
            )
            .field("nested", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Counter {
        fn bump(&mut self) -> u32;
    }

    #[repr(C)]
    struct Ticker {
        header: UnionHeader,
        ticks: u32,
    }

    unsafe impl UnionVariant for Ticker {
        type Header = UnionHeader;
        const TYPE_ID: u16 = 3;
        const NAME: &'static str = "Ticker";
    }

    impl Counter for Ticker {
        fn bump(&mut self) -> u32 {
            self.ticks += 1;
            self.ticks
        }
    }

    impl AsInterface<dyn Counter> for Ticker {
        fn as_interface(&self) -> &(dyn Counter + 'static) {
            self
        }
        fn as_interface_mut(&mut self) -> &mut (dyn Counter + 'static) {
            self
        }
    }

    #[repr(C)]
    struct Zero {
        header: UnionHeader,
    }

    unsafe impl UnionVariant for Zero {
        type Header = UnionHeader;
        const TYPE_ID: u16 = 0;
        const NAME: &'static str = "Zero";
    }

    impl Counter for Zero {
        fn bump(&mut self) -> u32 {
            0
        }
    }

    impl AsInterface<dyn Counter> for Zero {
        fn as_interface(&self) -> &(dyn Counter + 'static) {
            self
        }
        fn as_interface_mut(&mut self) -> &mut (dyn Counter + 'static) {
            self
        }
    }

    #[test]
    fn test_reserved_id_rejected() {
        let mut family: UnionFamily<dyn Counter> = UnionFamily::new("CounterHeader");
        let err = family.register::<Zero>().unwrap_err();
        assert!(matches!(err, UnionError::ReservedTypeId { variant: "Zero", .. }));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut family: UnionFamily<dyn Counter> = UnionFamily::new("CounterHeader");
        family.register::<Ticker>().unwrap();
        let err = family.register::<Ticker>().unwrap_err();
        assert!(matches!(err, UnionError::DuplicateTypeId { type_id: 3, .. }));
    }

    #[test]
    fn test_dispatch_mutates_through_header() {
        let mut family: UnionFamily<dyn Counter> = UnionFamily::new("CounterHeader");
        family.register::<Ticker>().unwrap();
        let mut ticker = Ticker {
            header: UnionHeader::for_variant::<Ticker>(),
            ticks: 0,
        };
        {
            let mut header = HeaderMut::new(&mut ticker);
            assert_eq!(family.dispatch(&mut header).unwrap().bump(), 1);
            assert_eq!(family.dispatch(&mut header).unwrap().bump(), 2);
        }
        assert_eq!(ticker.ticks, 2);
    }

    #[test]
    fn test_unset_header_is_unknown() {
        let family: UnionFamily<dyn Counter> = UnionFamily::new("CounterHeader");
        let header = UnionHeader::default();
        assert_eq!(family.type_name(&header), "Unknown (TypeID=0)");
        assert_eq!(family.size_of(&header), -1);
    }
}
