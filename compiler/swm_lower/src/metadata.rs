//! The metadata collaborator.
//!
//! Layout facts the lowering engine cannot derive from a type's spelling
//! (field offsets, enum cases, metadata identity) come from whoever can
//! read the runtime's metadata records. Live-process readers, object-file
//! readers and test fixtures all implement [`MetadataReader`].

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};
use swm_demangle::mangling::STDLIB_NAME;

use crate::error::{LoweringError, Result};
use crate::types::{AType, MetadataId, NominalDecl, NominalKind, NominalType, ProtocolDecl};

/// One stored field of a struct or class, or one case of an enum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    /// Field type, or the payload type of an enum case. `None` for cases
    /// without a payload.
    pub ty: Option<AType>,
    /// The case payload is boxed.
    pub is_indirect_case: bool,
    /// Byte offset from the start of the value. Zero for enum cases.
    pub offset: usize,
}

impl FieldLayout {
    pub fn field(ty: AType, offset: usize) -> Self {
        FieldLayout {
            ty: Some(ty),
            is_indirect_case: false,
            offset,
        }
    }

    pub fn case(payload: Option<AType>) -> Self {
        FieldLayout {
            ty: payload,
            is_indirect_case: false,
            offset: 0,
        }
    }

    pub fn indirect_case(payload: AType) -> Self {
        FieldLayout {
            ty: Some(payload),
            is_indirect_case: true,
            offset: 0,
        }
    }
}

/// Size, alignment and fields of a struct, class or enum instance, as
/// recorded in its value witness table and field descriptors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeLayout {
    pub size: usize,
    pub alignment: usize,
    pub fields: Vec<FieldLayout>,
}

/// Reads runtime metadata on behalf of the type builder and converter.
pub trait MetadataReader {
    /// Metadata identity and enum case count of a non-generic nominal type.
    fn nominal(&self, decl: &NominalDecl) -> Result<NominalMetadata>;

    /// Fills in the descriptor flags of a protocol.
    fn protocol(&self, module: &str, name: &str) -> Result<ProtocolDecl>;

    /// Metadata identity of the existential `protocols & superclass`,
    /// optionally class-bound.
    fn existential(
        &self,
        protocols: &[ProtocolDecl],
        superclass: Option<&AType>,
        has_explicit_any_object: bool,
    ) -> Result<MetadataId>;

    /// Layout of a struct or enum, generic or not.
    fn composite_layout(&self, ty: &AType) -> Result<CompositeLayout>;
}

/// What the metadata reader knows about a non-generic nominal type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NominalMetadata {
    pub id: MetadataId,
    /// Number of cases, for enums.
    pub case_count: Option<usize>,
}

// ── Static metadata ─────────────────────────────────────────────────

/// A [`MetadataReader`] over a fixed set of records registered up front.
///
/// Used where there is no process to read from: offline lowering of
/// symbol tables, and tests. `Swift.Error` is always known.
#[derive(Clone, Debug)]
pub struct StaticMetadata {
    nominals: FxHashMap<NominalDecl, NominalMetadata>,
    protocols: FxHashMap<(String, String), ProtocolDecl>,
    layouts: FxHashMap<AType, CompositeLayout>,
    next_id: u64,
}

impl Default for StaticMetadata {
    fn default() -> Self {
        StaticMetadata::new()
    }
}

impl StaticMetadata {
    pub fn new() -> Self {
        let mut metadata = StaticMetadata {
            nominals: FxHashMap::default(),
            protocols: FxHashMap::default(),
            layouts: FxHashMap::default(),
            next_id: 1,
        };
        metadata.add_protocol(ProtocolDecl::new(STDLIB_NAME, "Error"));
        metadata
    }

    fn register(&mut self, decl: NominalDecl, case_count: Option<usize>) -> AType {
        let id = MetadataId(self.next_id);
        self.next_id += 1;
        self.nominals
            .insert(decl.clone(), NominalMetadata { id, case_count });
        AType::Nominal(NominalType {
            decl,
            metadata: id,
            case_count,
        })
    }

    /// Registers a non-generic struct and returns its type.
    pub fn add_struct(&mut self, module: &str, name: &str, layout: CompositeLayout) -> AType {
        let ty = self.register(NominalDecl::new(NominalKind::Struct, module, name), None);
        self.layouts.insert(ty.clone(), layout);
        ty
    }

    /// Registers a non-generic enum with one layout field per case.
    pub fn add_enum(&mut self, module: &str, name: &str, layout: CompositeLayout) -> AType {
        let cases = layout.fields.len();
        let ty = self.register(NominalDecl::new(NominalKind::Enum, module, name), Some(cases));
        self.layouts.insert(ty.clone(), layout);
        ty
    }

    pub fn add_class(&mut self, module: &str, name: &str) -> AType {
        self.register(NominalDecl::new(NominalKind::Class, module, name), None)
    }

    pub fn add_protocol(&mut self, protocol: ProtocolDecl) {
        self.protocols
            .insert((protocol.module.clone(), protocol.name.clone()), protocol);
    }

    /// Records the layout of any struct or enum type, such as a bound
    /// generic one.
    pub fn set_layout(&mut self, ty: AType, layout: CompositeLayout) {
        self.layouts.insert(ty, layout);
    }
}

impl MetadataReader for StaticMetadata {
    fn nominal(&self, decl: &NominalDecl) -> Result<NominalMetadata> {
        self.nominals
            .get(decl)
            .copied()
            .ok_or_else(|| LoweringError::MissingMetadata(format!("{}.{}", decl.module, decl.name)))
    }

    fn protocol(&self, module: &str, name: &str) -> Result<ProtocolDecl> {
        self.protocols
            .get(&(module.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| LoweringError::MissingMetadata(format!("{module}.{name}")))
    }

    /// Existential metadata is uniqued by its parts, so the id is derived
    /// from them. Ids from this path have the top bit set and never
    /// collide with nominal ids.
    fn existential(
        &self,
        protocols: &[ProtocolDecl],
        superclass: Option<&AType>,
        has_explicit_any_object: bool,
    ) -> Result<MetadataId> {
        let mut hasher = FxHasher::default();
        protocols.hash(&mut hasher);
        superclass.hash(&mut hasher);
        has_explicit_any_object.hash(&mut hasher);
        Ok(MetadataId(hasher.finish() | (1 << 63)))
    }

    fn composite_layout(&self, ty: &AType) -> Result<CompositeLayout> {
        self.layouts
            .get(ty)
            .cloned()
            .ok_or_else(|| LoweringError::MissingMetadata(ty.to_string()))
    }
}
