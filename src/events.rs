// Licensed under the Apache-2.0 license

//! Interrupt/event enrichment for documented regions.
//!
//! Peripherals that own an interrupt line conventionally expose an event
//! manager as a `_STATUS` / `_PENDING` / `_ENABLE` register triple with no
//! declared fields. When the descriptor left those registers bare, this
//! module synthesizes one field per event source so the pages and the
//! descriptor show what each bit means. Matching is purely by register
//! name suffix; anything that does not match is left untouched.
//!
//! The module hierarchy is an arena with possibly shared submodules, so
//! the depth-first walk guards against revisiting with a visited set. The
//! set is created fresh for every top-level call.

use crate::decompose::{DocumentedField, DocumentedRegion, DocumentedRegister};
use crate::types::{AccessMode, EventManager, ModuleIdx, ModuleKind, SocDescription};
use anyhow::{bail, Result};
use std::collections::HashSet;

/// The three conventional event-manager registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EventRegisterKind {
    Status,
    Pending,
    Enable,
}

impl EventRegisterKind {
    fn from_register_name(name: &str) -> Option<Self> {
        if name.ends_with("_STATUS") {
            Some(Self::Status)
        } else if name.ends_with("_PENDING") {
            Some(Self::Pending)
        } else if name.ends_with("_ENABLE") {
            Some(Self::Enable)
        } else {
            None
        }
    }

    fn describe(&self, source: &str) -> String {
        match self {
            Self::Status => format!("Level of the `{}` event.", source),
            Self::Pending => format!(
                "`{}` event pending. Write a `1` to clear.",
                source
            ),
            Self::Enable => format!(
                "Write a `1` to enable the `{}` interrupt.",
                source
            ),
        }
    }

    fn access(&self) -> AccessMode {
        match self {
            Self::Status => AccessMode::ReadOnly,
            Self::Pending | Self::Enable => AccessMode::ReadWrite,
        }
    }
}

/// Collect every event manager reachable from `root`, depth first.
///
/// A fresh visited set guards against shared submodules being reported
/// twice (and against cycles in a malformed hierarchy).
pub fn gather_event_managers(soc: &SocDescription, root: ModuleIdx) -> Vec<EventManager> {
    let mut visited = HashSet::new();
    let mut found = Vec::new();
    walk(soc, root, &mut visited, &mut found);
    found
}

fn walk(
    soc: &SocDescription,
    idx: ModuleIdx,
    visited: &mut HashSet<ModuleIdx>,
    found: &mut Vec<EventManager>,
) {
    if !visited.insert(idx) {
        return;
    }
    let module = &soc.module_arena[idx];
    if let ModuleKind::EventManager(manager) = &module.kind {
        found.push(manager.clone());
    }
    for &sub in &module.submodules {
        walk(soc, sub, visited, found);
    }
}

/// Synthesize fields for a region's bare event-manager registers.
///
/// Best effort: regions without a module of the same name, or without an
/// event manager below it, are left as-is. Only registers matching the
/// conventional suffixes and declaring no fields are touched.
pub fn annotate_event_registers(soc: &SocDescription, region: &mut DocumentedRegion) {
    let Some(root) = soc.root_module_by_name(&region.name) else {
        return;
    };
    let managers = gather_event_managers(soc, root);
    let Some(manager) = managers.first() else {
        return;
    };
    for register in &mut region.registers {
        annotate_register(manager, register);
    }
}

fn annotate_register(manager: &EventManager, register: &mut DocumentedRegister) {
    if !register.fields.is_empty() {
        return;
    }
    let Some(kind) = EventRegisterKind::from_register_name(&register.name) else {
        return;
    };
    for (bit, source) in manager.sources.iter().enumerate() {
        let description = source
            .description
            .clone()
            .unwrap_or_else(|| kind.describe(&source.name));
        register.fields.push(DocumentedField {
            name: source.name.clone(),
            offset: bit,
            width: 1,
            reset: 0,
            access: kind.access(),
            description: Some(description),
            values: None,
            truncated_from: None,
        });
    }
}

/// Check that interrupt documentation can actually be produced.
///
/// Fatal when the caller asked for interrupt documentation but the SoC
/// description carries no interrupt map (no CPU/interrupt module was
/// elaborated).
pub fn require_interrupt_map(soc: &SocDescription) -> Result<()> {
    if soc.interrupt_map.is_none() {
        bail!(
            "interrupt documentation requested, but the SoC description \
             has no `interrupt_map` (no CPU/interrupt module)"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CsrRegion, CsrRegister, EventSource, SocModule,
    };

    fn soc_with_event_manager() -> SocDescription {
        let mut soc = SocDescription::new();
        let ev = soc.add_module(SocModule::event_manager(
            "ev",
            EventManager::new()
                .add_source(EventSource::new("zero"))
                .add_source(EventSource::new("overflow").with_description("Counter wrapped.")),
        ));
        let root = soc.add_module(SocModule::plain("timer0").add_submodule(ev));
        soc.add_root_module(root);
        soc
    }

    fn documented_timer_region() -> DocumentedRegion {
        let region = CsrRegion::new("timer0", 0x8000_0000, 32)
            .add_register(CsrRegister::new("ev_status", 2))
            .add_register(CsrRegister::new("ev_pending", 2))
            .add_register(CsrRegister::new("ev_enable", 2))
            .add_register(CsrRegister::new("value", 32));
        DocumentedRegion::from_region(&region).unwrap().unwrap()
    }

    #[test]
    fn test_event_registers_get_fields() {
        let soc = soc_with_event_manager();
        let mut region = documented_timer_region();
        annotate_event_registers(&soc, &mut region);

        let status = &region.registers[0];
        assert_eq!(status.fields.len(), 2);
        assert_eq!(status.fields[0].name, "zero");
        assert_eq!(status.fields[0].offset, 0);
        assert_eq!(
            status.fields[0].description.as_deref(),
            Some("Level of the `zero` event.")
        );
        // Explicit source descriptions win over the synthesized text.
        assert_eq!(
            status.fields[1].description.as_deref(),
            Some("Counter wrapped.")
        );

        let pending = &region.registers[1];
        assert!(pending.fields[0]
            .description
            .as_deref()
            .unwrap()
            .contains("Write a `1` to clear"));

        // Non-matching registers are untouched.
        assert!(region.registers[3].fields.is_empty());
    }

    #[test]
    fn test_registers_with_fields_are_untouched() {
        let soc = soc_with_event_manager();
        let region = CsrRegion::new("timer0", 0, 32).add_register(
            CsrRegister::new("ev_status", 2)
                .add_field(crate::types::CsrField::new("declared", 0, 2)),
        );
        let mut doc = DocumentedRegion::from_region(&region).unwrap().unwrap();
        annotate_event_registers(&soc, &mut doc);
        assert_eq!(doc.registers[0].fields.len(), 1);
        assert_eq!(doc.registers[0].fields[0].name, "declared");
    }

    #[test]
    fn test_shared_submodule_visited_once() {
        let mut soc = SocDescription::new();
        let shared = soc.add_module(SocModule::event_manager(
            "ev",
            EventManager::new().add_source(EventSource::new("done")),
        ));
        let a = soc.add_module(SocModule::plain("a").add_submodule(shared));
        let b = soc.add_module(SocModule::plain("b").add_submodule(shared));
        let root = soc.add_module(
            SocModule::plain("top").add_submodule(a).add_submodule(b),
        );
        soc.add_root_module(root);

        let managers = gather_event_managers(&soc, root);
        assert_eq!(managers.len(), 1);
    }

    #[test]
    fn test_consecutive_walks_are_independent() {
        // A second walk over the same root sees the full hierarchy again.
        let soc = soc_with_event_manager();
        let root = soc.root_module_by_name("timer0").unwrap();
        assert_eq!(gather_event_managers(&soc, root).len(), 1);
        assert_eq!(gather_event_managers(&soc, root).len(), 1);
    }

    #[test]
    fn test_missing_interrupt_map_is_fatal() {
        let soc = SocDescription::new();
        let err = require_interrupt_map(&soc).unwrap_err();
        assert!(err.to_string().contains("interrupt_map"));
    }
}
