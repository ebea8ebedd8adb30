// Licensed under the Apache-2.0 license

//! Decomposition of logical registers into bus-sized documented registers.
//!
//! A logical register wider than the CSR bus is materialized as
//! `ceil(width / bus_width)` sub-registers, one bus word each. Address
//! index 0 (the lowest address) carries the highest-order bit slice:
//!
//! ```text
//! bus width 8, CTRL (16 bits, reset 0x1234)
//!
//!   CTRL0 @ base+0   bits [8,16)   reset 0x12
//!   CTRL1 @ base+4   bits [0,8)    reset 0x34
//! ```
//!
//! Each sub-register records its bit offset within the logical register,
//! a reset value sliced from the logical reset, and the field list clipped
//! to the bits it physically carries. A field straddling a sub-register
//! boundary is truncated; the truncated copy keeps a marker counting the
//! dropped low bits so the rendered name can show the original bit
//! positions (`IRQ[7:4]` vs `IRQ[3:0]`).
//!
//! The address cursor advances by one bus word (4 address units) per
//! sub-register regardless of the bus width, so a region's address block
//! is always `4 × (documented registers)` bytes.

use crate::types::{AccessMode, CsrField, CsrRegion, CsrRegister, FieldValue, RegionPayload};
use anyhow::{bail, Result};

/// Mask covering the low `width` bits.
fn bit_mask(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Bit-range label used in rendered pages: `[offset+size:offset]`, or
/// `[offset]` for single bits. The displayed high bound is `offset+size`,
/// matching the display convention of the build system's own pages.
pub fn bit_range_label(offset: usize, size: usize) -> String {
    if size == 1 {
        format!("[{}]", offset)
    } else {
        format!("[{}:{}]", offset + size, offset)
    }
}

//=============================================================================
// DocumentedField
//=============================================================================

/// A field clipped to one documented register's bit range.
#[derive(Clone, Debug)]
pub struct DocumentedField {
    /// Field name, without any truncation suffix.
    pub name: String,

    /// Bit offset local to the documented register.
    pub offset: usize,

    /// Width in bits after any truncation.
    pub width: usize,

    /// Reset value of the surviving bits.
    pub reset: u64,

    /// Software access mode.
    pub access: AccessMode,

    /// Free-text description.
    pub description: Option<String>,

    /// Value enumeration, carried over untouched from the input.
    pub values: Option<Vec<FieldValue>>,

    /// Truncation marker: the number of low field bits dropped by the
    /// split. `Some(0)` means the field was only truncated from above.
    /// `None` means the field survived whole.
    pub truncated_from: Option<usize>,
}

impl DocumentedField {
    fn from_input(field: &CsrField) -> Self {
        Self {
            name: field.name.clone(),
            offset: field.offset,
            width: field.width,
            reset: field.reset,
            access: field.access,
            description: field.description.clone(),
            values: field.values.clone(),
            truncated_from: None,
        }
    }

    /// Name as rendered in diagrams and tables. Truncated fields carry an
    /// inclusive field-relative bit range, e.g. `IRQ[7:4]`.
    pub fn display_name(&self) -> String {
        match self.truncated_from {
            None => self.name.clone(),
            Some(start) if self.width == 1 => format!("{}[{}]", self.name, start),
            Some(start) => format!("{}[{}:{}]", self.name, start + self.width - 1, start),
        }
    }
}

/// Clip `fields` (defined over the logical register) to the sub-range
/// `[start, end)`, re-based to local coordinates.
///
/// Fields entirely outside the range are dropped: each documented register
/// lists only the bits it physically carries. Splitting over the full
/// register range is the identity (no truncation markers).
pub fn split_fields(fields: &[CsrField], start: usize, end: usize) -> Vec<DocumentedField> {
    let span = end - start;
    let mut result = Vec::new();
    for field in fields {
        if field.offset + field.width <= start || field.offset >= end {
            continue;
        }
        let mut out = DocumentedField::from_input(field);
        let local = field.offset as i64 - start as i64;
        if local < 0 {
            let dropped = (-local) as usize;
            out.truncated_from = Some(dropped);
            out.offset = 0;
            out.width -= dropped;
            out.reset = (out.reset >> dropped) & bit_mask(out.width);
        } else {
            out.offset = local as usize;
        }
        if out.offset + out.width > span {
            out.width = span - out.offset;
            out.reset &= bit_mask(out.width);
            if out.truncated_from.is_none() {
                out.truncated_from = Some(0);
            }
        }
        result.push(out);
    }
    result
}

//=============================================================================
// Sub-register bit ranges
//=============================================================================

/// The bit slice covered by one sub-register of a compound register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubRange {
    /// Bit origin within the logical register.
    pub origin: usize,

    /// Bits covered, `min(width - origin, bus_width)`.
    pub width: usize,

    /// Derived upper-case name, `NAME<index>` for compound registers.
    pub name: String,
}

/// Compute the bit slice for address index `index` of `register`.
///
/// Sub-registers are laid out from the most-significant word down: address
/// index 0 covers the highest bits. The word index is
/// `nwords - index - 1`, the origin `word * bus_width`.
pub fn sub_register_bit_range(bus_width: usize, register: &CsrRegister, index: usize) -> SubRange {
    let nwords = register.width.div_ceil(bus_width);
    let word = nwords - index - 1;
    let origin = word * bus_width;
    let width = (register.width - origin).min(bus_width);
    let name = if nwords > 1 {
        format!("{}{}", register.name, index)
    } else {
        register.name.clone()
    };
    SubRange {
        origin,
        width,
        name: name.to_uppercase(),
    }
}

//=============================================================================
// DocumentedRegister
//=============================================================================

/// One bus-word-sized documented register.
///
/// For logical registers no wider than the bus this is a one-to-one copy;
/// for compound registers there is one per bus word.
#[derive(Clone, Debug)]
pub struct DocumentedRegister {
    /// Full name including the region prefix, e.g. `TIMER0_CTRL1`.
    pub name: String,

    /// Logical register name, upper-case, without region prefix or index.
    pub short_name: String,

    /// Short name plus sub-register index, e.g. `CTRL1` (used in the
    /// descriptor output).
    pub short_numbered_name: String,

    /// Absolute bus address.
    pub address: u64,

    /// Bit offset of this slice within the logical register.
    pub offset: usize,

    /// Bits covered by this slice.
    pub size: usize,

    /// Reset value of the covered bits.
    pub reset: u64,

    /// Software access mode.
    pub access: AccessMode,

    /// Prose description (provenance note plus any register description).
    pub description: Option<String>,

    /// Fields clipped to this slice.
    pub fields: Vec<DocumentedField>,
}

//=============================================================================
// DocumentedRegion
//=============================================================================

/// A CSR region with all registers decomposed for documentation.
#[derive(Clone, Debug)]
pub struct DocumentedRegion {
    /// Region name (as supplied, lower-case by convention).
    pub name: String,

    /// Region base address.
    pub origin: u64,

    /// CSR bus width in bits.
    pub bus_width: usize,

    /// Documented registers in address order.
    pub registers: Vec<DocumentedRegister>,

    /// Byte size of the documented address block:
    /// 4 × (documented registers).
    pub size: u64,
}

impl DocumentedRegion {
    /// Decompose a region's register list.
    ///
    /// Returns `Ok(None)` for opaque payloads, which the caller is
    /// expected to skip (a warning is logged here). Unaligned base
    /// addresses are a malformed descriptor.
    pub fn from_region(region: &CsrRegion) -> Result<Option<Self>> {
        if region.base_address % 4 != 0 {
            bail!(
                "CSR region `{}` base address {:#x} is not bus aligned",
                region.name,
                region.base_address
            );
        }
        let registers = match &region.payload {
            RegionPayload::Registers(registers) => registers,
            RegionPayload::Opaque(kind) => {
                log::warn!(
                    "skipping CSR region `{}`: unrecognized payload `{}`",
                    region.name,
                    kind
                );
                return Ok(None);
            }
        };

        let mut doc = Self {
            name: region.name.clone(),
            origin: region.base_address,
            bus_width: region.bus_width,
            registers: Vec::new(),
            size: 0,
        };
        for register in registers {
            doc.document_register(region, register);
        }
        doc.size = 4 * doc.registers.len() as u64;
        Ok(Some(doc))
    }

    /// Append the documented form of one logical register, advancing the
    /// address cursor by 4 per emitted sub-register.
    fn document_register(&mut self, region: &CsrRegion, register: &CsrRegister) {
        let full_name = format!(
            "{}_{}",
            region.name.to_uppercase(),
            register.name.to_uppercase()
        );
        let nwords = register.width.div_ceil(self.bus_width);
        let cursor = self.origin + 4 * self.registers.len() as u64;

        if nwords == 1 {
            self.registers.push(DocumentedRegister {
                name: full_name,
                short_name: register.name.to_uppercase(),
                short_numbered_name: register.name.to_uppercase(),
                address: cursor,
                offset: 0,
                size: register.width,
                reset: register.reset & bit_mask(register.width),
                access: register.access,
                description: register.description.clone(),
                fields: register.fields.iter().map(DocumentedField::from_input).collect(),
            });
            return;
        }

        for index in 0..nwords {
            let sub = sub_register_bit_range(self.bus_width, register, index);
            let mut description = format!(
                "Bits {}-{} of `{}`.",
                sub.origin,
                sub.origin + sub.width,
                full_name
            );
            if register.atomic_write {
                if index == 0 {
                    description.push_str(&format!(
                        " Writing this register triggers an update of `{}`.",
                        full_name
                    ));
                } else {
                    description.push_str(&format!(
                        " The value won't take effect until `{}0` is written.",
                        full_name
                    ));
                }
            }
            if index == 0 {
                if let Some(d) = &register.description {
                    description.push(' ');
                    description.push_str(d);
                }
            }
            self.registers.push(DocumentedRegister {
                name: format!("{}_{}", region.name.to_uppercase(), sub.name),
                short_name: register.name.to_uppercase(),
                short_numbered_name: sub.name.clone(),
                address: cursor + 4 * index as u64,
                offset: sub.origin,
                size: sub.width,
                // The top word's origin can reach or exceed 64 bits.
                reset: register.reset.checked_shr(sub.origin as u32).unwrap_or(0)
                    & bit_mask(sub.width),
                access: register.access,
                description: Some(description),
                fields: split_fields(&register.fields, sub.origin, sub.origin + sub.width),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CsrField, CsrRegion, CsrRegister};

    fn ctrl_16bit() -> CsrRegister {
        CsrRegister::new("ctrl", 16).with_reset(0x1234)
    }

    #[test]
    fn test_narrow_register_is_passed_through() {
        let region = CsrRegion::new("timer0", 0x8000_0000, 32).add_register(
            CsrRegister::new("status", 8)
                .with_reset(0xab)
                .add_field(CsrField::new("busy", 0, 1))
                .add_field(CsrField::new("code", 1, 7)),
        );
        let doc = DocumentedRegion::from_region(&region).unwrap().unwrap();
        assert_eq!(doc.registers.len(), 1);
        let reg = &doc.registers[0];
        assert_eq!(reg.name, "TIMER0_STATUS");
        assert_eq!(reg.offset, 0);
        assert_eq!(reg.size, 8);
        assert_eq!(reg.reset, 0xab);
        assert_eq!(reg.fields.len(), 2);
        assert!(reg.fields.iter().all(|f| f.truncated_from.is_none()));
    }

    #[test]
    fn test_worked_example_ctrl_16_over_8() {
        let region =
            CsrRegion::new("spi", 0x8000_1000, 8).add_register(ctrl_16bit());
        let doc = DocumentedRegion::from_region(&region).unwrap().unwrap();
        assert_eq!(doc.registers.len(), 2);

        let hi = &doc.registers[0];
        assert_eq!(hi.name, "SPI_CTRL0");
        assert_eq!(hi.short_numbered_name, "CTRL0");
        assert_eq!(hi.address, 0x8000_1000);
        assert_eq!(hi.offset, 8);
        assert_eq!(hi.size, 8);
        assert_eq!(hi.reset, 0x12);

        let lo = &doc.registers[1];
        assert_eq!(lo.name, "SPI_CTRL1");
        assert_eq!(lo.address, 0x8000_1004);
        assert_eq!(lo.offset, 0);
        assert_eq!(lo.size, 8);
        assert_eq!(lo.reset, 0x34);
    }

    #[test]
    fn test_decomposition_partitions_bit_range() {
        // 70 bits over a 32-bit bus: 3 words covering [64,70), [32,64), [0,32).
        let reg = CsrRegister::new("dma_addr", 70);
        let region = CsrRegion::new("dma", 0x9000_0000, 32).add_register(reg.clone());
        let doc = DocumentedRegion::from_region(&region).unwrap().unwrap();
        assert_eq!(doc.registers.len(), 3);

        let mut covered = Vec::new();
        let mut last_address = None;
        for sub in &doc.registers {
            if let Some(prev) = last_address {
                assert_eq!(sub.address, prev + 4);
            }
            last_address = Some(sub.address);
            covered.push((sub.offset, sub.offset + sub.size));
        }
        covered.sort();
        assert_eq!(covered, vec![(0, 32), (32, 64), (64, 70)]);
    }

    #[test]
    fn test_wide_register_reset_slices() {
        // 70 bits: the top word's origin (64) exceeds the reset type's
        // width, so its slice is all zeros rather than a panic.
        let region = CsrRegion::new("dma", 0x9000_0000, 32).add_register(
            CsrRegister::new("dma_addr", 70).with_reset(0xdead_beef_cafe_f00d),
        );
        let doc = DocumentedRegion::from_region(&region).unwrap().unwrap();
        assert_eq!(doc.registers[0].offset, 64);
        assert_eq!(doc.registers[0].reset, 0);
        assert_eq!(doc.registers[1].reset, 0xdead_beef);
        assert_eq!(doc.registers[2].reset, 0xcafe_f00d);
    }

    #[test]
    fn test_split_fields_identity_over_full_range() {
        let fields = vec![
            CsrField::new("lo", 0, 4).with_reset(0x5),
            CsrField::new("hi", 4, 12).with_reset(0x123),
        ];
        let out = split_fields(&fields, 0, 16);
        assert_eq!(out.len(), 2);
        for (a, b) in fields.iter().zip(&out) {
            assert_eq!(a.offset, b.offset);
            assert_eq!(a.width, b.width);
            assert_eq!(a.reset, b.reset);
            assert!(b.truncated_from.is_none());
        }
    }

    #[test]
    fn test_split_truncates_from_below() {
        // Field covers bits [6,10); against [8,16) only [8,10) survives.
        let fields = vec![CsrField::new("f", 6, 4).with_reset(0b1011)];
        let out = split_fields(&fields, 8, 16);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].offset, 0);
        assert_eq!(out[0].width, 2);
        assert_eq!(out[0].truncated_from, Some(2));
        // Reset keeps the surviving high bits: 0b1011 >> 2 = 0b10.
        assert_eq!(out[0].reset, 0b10);
        assert_eq!(out[0].display_name(), "f[3:2]");
    }

    #[test]
    fn test_split_truncates_from_above() {
        // Field covers bits [6,10); against [0,8) only [6,8) survives.
        let fields = vec![CsrField::new("f", 6, 4).with_reset(0b1011)];
        let out = split_fields(&fields, 0, 8);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].offset, 6);
        assert_eq!(out[0].width, 2);
        assert_eq!(out[0].truncated_from, Some(0));
        assert_eq!(out[0].reset, 0b11);
        assert_eq!(out[0].display_name(), "f[1:0]");
    }

    #[test]
    fn test_split_drops_disjoint_fields() {
        let fields = vec![
            CsrField::new("below", 0, 8),
            CsrField::new("inside", 9, 2),
            CsrField::new("above", 16, 8),
        ];
        let out = split_fields(&fields, 8, 16);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "inside");
        assert_eq!(out[0].offset, 1);
        assert!(out[0].truncated_from.is_none());
    }

    #[test]
    fn test_straddling_field_names_disambiguate() {
        // 8-bit field split across two 4-bit halves of [0,8).
        let fields = vec![CsrField::new("irq", 0, 8)];
        let hi = split_fields(&fields, 4, 8);
        let lo = split_fields(&fields, 0, 4);
        assert_eq!(hi[0].display_name(), "irq[7:4]");
        assert_eq!(lo[0].display_name(), "irq[3:0]");
    }

    #[test]
    fn test_atomic_write_annotations() {
        let region = CsrRegion::new("rtc", 0xa000_0000, 8).add_register(
            CsrRegister::new("load", 16)
                .with_atomic_write()
                .with_description("Load value."),
        );
        let doc = DocumentedRegion::from_region(&region).unwrap().unwrap();
        let trigger = doc.registers[0].description.as_deref().unwrap();
        assert!(trigger.contains("Writing this register triggers an update of `RTC_LOAD`."));
        assert!(trigger.contains("Load value."));
        let other = doc.registers[1].description.as_deref().unwrap();
        assert!(other.contains("The value won't take effect until `RTC_LOAD0` is written."));
        assert!(!other.contains("Load value."));
    }

    #[test]
    fn test_provenance_notes() {
        let region = CsrRegion::new("spi", 0, 8).add_register(ctrl_16bit());
        let doc = DocumentedRegion::from_region(&region).unwrap().unwrap();
        assert_eq!(
            doc.registers[0].description.as_deref(),
            Some("Bits 8-16 of `SPI_CTRL`.")
        );
        assert_eq!(
            doc.registers[1].description.as_deref(),
            Some("Bits 0-8 of `SPI_CTRL`.")
        );
    }

    #[test]
    fn test_region_size_counts_sub_registers() {
        let region = CsrRegion::new("spi", 0, 8)
            .add_register(ctrl_16bit())
            .add_register(CsrRegister::new("status", 8));
        let doc = DocumentedRegion::from_region(&region).unwrap().unwrap();
        assert_eq!(doc.registers.len(), 3);
        assert_eq!(doc.size, 12);
    }

    #[test]
    fn test_opaque_region_is_skipped() {
        let region = CsrRegion::opaque("rom", 0x0, 32, "memory window");
        assert!(DocumentedRegion::from_region(&region).unwrap().is_none());
    }

    #[test]
    fn test_unaligned_base_is_fatal() {
        let region = CsrRegion::new("bad", 0x8000_0002, 32);
        let err = DocumentedRegion::from_region(&region).unwrap_err();
        assert!(err.to_string().contains("not bus aligned"));
    }

    #[test]
    fn test_bit_range_label() {
        assert_eq!(bit_range_label(3, 1), "[3]");
        assert_eq!(bit_range_label(0, 8), "[8:0]");
        assert_eq!(bit_range_label(4, 4), "[8:4]");
    }
}
