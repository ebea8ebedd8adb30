// Licensed under the Apache-2.0 license

//! Input data model for an elaborated SoC's CSR metadata.
//!
//! The hardware build system hands us an already-elaborated description:
//! a list of CSR regions, each region's register list, each register's
//! field layout, plus the CPU's interrupt map and the module hierarchy.
//! This module is the typed form of that contract.
//!
//! ## Structure Overview
//!
//! ```text
//! SocDescription
//! ├── regions: Vec<CsrRegion>          # Ordered CSR regions
//! │   └── RegionPayload::Registers     # Register list (or Opaque)
//! │       └── CsrRegister
//! │           └── CsrField
//! │               └── FieldValue       # Value enumeration rows
//! │
//! ├── interrupt_map                    # Region name → IRQ number
//! │
//! └── module_arena: Vec<SocModule>     # Module hierarchy
//!     └── References by ModuleIdx      # Submodules may be shared
//! ```
//!
//! The module hierarchy uses an arena addressed by [`ModuleIdx`] so that a
//! submodule instantiated under several parents is a single entry reachable
//! through multiple parents. Traversals must carry their own visited set
//! (see [`crate::events::gather_event_managers`]).
//!
//! Every optional attribute the build system may omit has an explicit
//! default here; construction goes through builder methods so callers only
//! spell out what they set.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Index into [`SocDescription::module_arena`].
pub type ModuleIdx = usize;

//=============================================================================
// SocDescription - Root of the input contract
//=============================================================================

/// The complete CSR-visible description of one SoC build.
#[derive(Clone, Debug, Default)]
pub struct SocDescription {
    /// Ordered CSR regions.
    pub regions: Vec<CsrRegion>,

    /// Interrupt assignments, region name → IRQ number. `None` when the
    /// build has no interrupt controller wired up.
    pub interrupt_map: Option<BTreeMap<String, u32>>,

    /// Arena of all modules in the design hierarchy.
    /// Modules are added but never deleted, so indices remain stable.
    pub module_arena: Vec<SocModule>,

    /// Top-level module indices, in elaboration order.
    pub root_modules: Vec<ModuleIdx>,
}

impl SocDescription {
    /// Create an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a region.
    pub fn add_region(mut self, region: CsrRegion) -> Self {
        self.regions.push(region);
        self
    }

    /// Set the interrupt map.
    pub fn with_interrupt_map(mut self, map: BTreeMap<String, u32>) -> Self {
        self.interrupt_map = Some(map);
        self
    }

    /// Add a module to the arena and return its index. The module is not
    /// reachable until registered as a root or as some parent's submodule.
    pub fn add_module(&mut self, module: SocModule) -> ModuleIdx {
        self.module_arena.push(module);
        self.module_arena.len() - 1
    }

    /// Register a top-level module.
    pub fn add_root_module(&mut self, idx: ModuleIdx) {
        self.root_modules.push(idx);
    }

    /// Look up a root module by name.
    pub fn root_module_by_name(&self, name: &str) -> Option<ModuleIdx> {
        self.root_modules
            .iter()
            .copied()
            .find(|&idx| self.module_arena[idx].name == name)
    }

    /// IRQ number assigned to `region`, if any.
    pub fn irq_for_region(&self, region: &str) -> Option<u32> {
        self.interrupt_map.as_ref()?.get(region).copied()
    }

    /// First documentation module reachable from `root`, depth first in
    /// declaration order. Used as the peripheral-level prose.
    pub fn first_module_doc(&self, root: ModuleIdx) -> Option<&ModuleDoc> {
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if !visited.insert(idx) {
                continue;
            }
            let module = &self.module_arena[idx];
            if let ModuleKind::Documentation(doc) = &module.kind {
                return Some(doc);
            }
            for &sub in module.submodules.iter().rev() {
                stack.push(sub);
            }
        }
        None
    }
}

//=============================================================================
// Regions
//=============================================================================

/// A contiguous address range owned by one peripheral's CSR bank.
#[derive(Clone, Debug)]
pub struct CsrRegion {
    /// Region name (lower-case by convention, e.g. "timer0").
    pub name: String,

    /// Absolute base address. Must be 4-byte aligned.
    pub base_address: u64,

    /// Data width of one CSR bus transfer, in bits.
    pub bus_width: usize,

    /// What the region actually contains.
    pub payload: RegionPayload,
}

impl CsrRegion {
    /// Create a region holding a register list.
    pub fn new(name: &str, base_address: u64, bus_width: usize) -> Self {
        Self {
            name: name.to_string(),
            base_address,
            bus_width,
            payload: RegionPayload::Registers(Vec::new()),
        }
    }

    /// Append a register.
    pub fn add_register(mut self, register: CsrRegister) -> Self {
        debug_assert!(matches!(self.payload, RegionPayload::Registers(_)));
        if let RegionPayload::Registers(regs) = &mut self.payload {
            regs.push(register);
        }
        self
    }

    /// Mark the region as carrying a payload this generator does not
    /// understand (e.g. a raw memory window). Such regions are skipped
    /// with a warning during generation.
    pub fn opaque(name: &str, base_address: u64, bus_width: usize, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            base_address,
            bus_width,
            payload: RegionPayload::Opaque(kind.to_string()),
        }
    }
}

/// Contents of a CSR region.
#[derive(Clone, Debug)]
pub enum RegionPayload {
    /// The normal case: an ordered register list.
    Registers(Vec<CsrRegister>),

    /// Anything else the build system exposed under a CSR base address.
    /// The string names the payload kind for the skip warning.
    Opaque(String),
}

//=============================================================================
// Registers
//=============================================================================

/// One logical register as declared by the peripheral.
///
/// A logical register wider than the region's bus width is materialized as
/// multiple bus-sized sub-registers during documentation; see
/// [`crate::decompose`].
#[derive(Clone, Debug)]
pub struct CsrRegister {
    /// Register name (e.g. "ctrl").
    pub name: String,

    /// Width in bits. May exceed the bus width.
    pub width: usize,

    /// Reset value of the full logical register.
    pub reset: u64,

    /// Software access mode.
    pub access: AccessMode,

    /// When set, the register is a write-triggered compound register:
    /// writing the first sub-register commits the combined value.
    pub atomic_write: bool,

    /// Free-text description.
    pub description: Option<String>,

    /// Field layout. Empty when the register is documented as one opaque
    /// value.
    pub fields: Vec<CsrField>,
}

impl CsrRegister {
    /// Create a register with defaults: reset 0, read-write, no atomic
    /// write, no description, no fields.
    pub fn new(name: &str, width: usize) -> Self {
        Self {
            name: name.to_string(),
            width,
            reset: 0,
            access: AccessMode::ReadWrite,
            atomic_write: false,
            description: None,
            fields: Vec::new(),
        }
    }

    /// Set the reset value.
    pub fn with_reset(mut self, reset: u64) -> Self {
        self.reset = reset;
        self
    }

    /// Set the access mode.
    pub fn with_access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    /// Mark the register as atomically written.
    pub fn with_atomic_write(mut self) -> Self {
        self.atomic_write = true;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Append a field.
    pub fn add_field(mut self, field: CsrField) -> Self {
        self.fields.push(field);
        self
    }
}

//=============================================================================
// Fields
//=============================================================================

/// A bit field within a logical register.
#[derive(Clone, Debug)]
pub struct CsrField {
    /// Field name (e.g. "enable").
    pub name: String,

    /// Bit offset within the enclosing logical register.
    pub offset: usize,

    /// Width in bits.
    pub width: usize,

    /// Reset value of this field (field-relative).
    pub reset: u64,

    /// Software access mode.
    pub access: AccessMode,

    /// Free-text description.
    pub description: Option<String>,

    /// Value enumeration. `None` means the field is a plain number;
    /// `Some(vec![])` is a malformed descriptor and aborts generation.
    pub values: Option<Vec<FieldValue>>,
}

impl CsrField {
    /// Create a field with defaults: reset 0, read-write, no description,
    /// no value enumeration.
    pub fn new(name: &str, offset: usize, width: usize) -> Self {
        Self {
            name: name.to_string(),
            offset,
            width,
            reset: 0,
            access: AccessMode::ReadWrite,
            description: None,
            values: None,
        }
    }

    /// Set the reset value.
    pub fn with_reset(mut self, reset: u64) -> Self {
        self.reset = reset;
        self
    }

    /// Set the access mode.
    pub fn with_access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Set the value enumeration.
    pub fn with_values(mut self, values: Vec<FieldValue>) -> Self {
        self.values = Some(values);
        self
    }
}

/// One row of a field's value enumeration.
#[derive(Clone, Debug)]
pub struct FieldValue {
    /// The encoded value, as displayed (e.g. "0b01", "0x3").
    pub value: String,

    /// Optional short name for the value.
    pub name: Option<String>,

    /// Human-readable meaning.
    pub description: String,
}

impl FieldValue {
    /// Create a value row without a short name.
    pub fn new(value: &str, description: &str) -> Self {
        Self {
            value: value.to_string(),
            name: None,
            description: description.to_string(),
        }
    }

    /// Create a value row with a short name.
    pub fn named(value: &str, name: &str, description: &str) -> Self {
        Self {
            value: value.to_string(),
            name: Some(name.to_string()),
            description: description.to_string(),
        }
    }
}

//=============================================================================
// Access modes
//=============================================================================

/// Software access mode of a register or field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    #[default]
    ReadWrite,
}

impl fmt::Display for AccessMode {
    /// SVD spelling, also used in the prose pages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessMode::ReadOnly => "read-only",
            AccessMode::WriteOnly => "write-only",
            AccessMode::ReadWrite => "read-write",
        };
        write!(f, "{}", s)
    }
}

//=============================================================================
// Module hierarchy
//=============================================================================

/// A module in the design hierarchy.
///
/// Only two kinds matter to the documentation: event managers (interrupt
/// annotation) and documentation modules (prose pages). Everything else is
/// `Plain` and only contributes its submodules to the walk.
#[derive(Clone, Debug)]
pub struct SocModule {
    /// Module instance name.
    pub name: String,

    /// What this module contributes to the documentation.
    pub kind: ModuleKind,

    /// Submodule indices. May point at entries shared with other parents.
    pub submodules: Vec<ModuleIdx>,
}

impl SocModule {
    /// Create a plain module with no submodules.
    pub fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ModuleKind::Plain,
            submodules: Vec::new(),
        }
    }

    /// Create an event manager module.
    pub fn event_manager(name: &str, manager: EventManager) -> Self {
        Self {
            name: name.to_string(),
            kind: ModuleKind::EventManager(manager),
            submodules: Vec::new(),
        }
    }

    /// Create a documentation module.
    pub fn documentation(name: &str, doc: ModuleDoc) -> Self {
        Self {
            name: name.to_string(),
            kind: ModuleKind::Documentation(doc),
            submodules: Vec::new(),
        }
    }

    /// Append a submodule index.
    pub fn add_submodule(mut self, idx: ModuleIdx) -> Self {
        self.submodules.push(idx);
        self
    }
}

/// Documentation-relevant classification of a module.
#[derive(Clone, Debug)]
pub enum ModuleKind {
    /// A status/pending/enable interrupt event manager.
    EventManager(EventManager),

    /// Free-form prose that gets its own documentation page.
    Documentation(ModuleDoc),

    /// No direct documentation contribution.
    Plain,
}

/// The event sources managed by one event manager.
#[derive(Clone, Debug, Default)]
pub struct EventManager {
    /// Event sources in bit order (source `i` owns bit `i` of the
    /// status/pending/enable registers).
    pub sources: Vec<EventSource>,
}

impl EventManager {
    /// Create an empty event manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event source.
    pub fn add_source(mut self, source: EventSource) -> Self {
        self.sources.push(source);
        self
    }
}

/// One interrupt event source.
#[derive(Clone, Debug)]
pub struct EventSource {
    /// Source name, used as the synthesized field name.
    pub name: String,

    /// Optional description of the event.
    pub description: Option<String>,
}

impl EventSource {
    /// Create a source without a description.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Prose attached to a module, rendered to its own page.
#[derive(Clone, Debug)]
pub struct ModuleDoc {
    /// Page title. Defaults to the first line of the body when `None`.
    pub title: Option<String>,

    /// Body text (reStructuredText).
    pub body: String,
}

impl ModuleDoc {
    /// Create a documentation body; the first line becomes the title.
    pub fn new(body: &str) -> Self {
        Self {
            title: None,
            body: body.to_string(),
        }
    }

    /// Set an explicit title.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// The effective title: the explicit one, or the first body line.
    pub fn title(&self) -> &str {
        match &self.title {
            Some(t) => t,
            None => self.body.lines().next().unwrap_or(""),
        }
    }

    /// The body with the implicit title line removed.
    pub fn body(&self) -> String {
        if self.title.is_some() {
            self.body.trim().to_string()
        } else {
            let mut lines = self.body.lines();
            lines.next();
            lines.collect::<Vec<_>>().join("\n").trim().to_string()
        }
    }
}
