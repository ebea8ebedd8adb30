// Licensed under the Apache-2.0 license

//! Sphinx/reStructuredText documentation emitter.
//!
//! Produces a documentation tree under a target directory:
//!
//! ```text
//! base_dir/
//! ├── conf.py          # Sphinx configuration
//! ├── index.rst        # Toctree + module / register group listings
//! ├── interrupts.rst   # IRQ assignments (when interrupt docs are on)
//! ├── <module>.rst     # One page per documentation module
//! ├── <region>.rst     # One page per CSR region
//! └── _static/
//! ```
//!
//! Each region page carries one entry per documented (bus-word-sized)
//! register: a heading, the computed address, the description, a WaveDrom
//! bit diagram, and a field table. Registers without declared fields get a
//! single pseudo-field spanning their own bit slice, padded with filler up
//! to the bus width.

use crate::config::DocConfig;
use crate::decompose::{bit_range_label, DocumentedRegion, DocumentedRegister};
use crate::events::{annotate_event_registers, require_interrupt_map};
use crate::rst::{heading, make_value_table, print_table, reflow};
use crate::types::{ModuleIdx, ModuleKind, SocDescription};
use anyhow::{Context, Result};
use chrono::Datelike;
use std::collections::HashSet;
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Generate the complete documentation tree for `soc` under `base_dir`.
///
/// Regions with payloads this generator does not understand are skipped
/// with a warning. Malformed value enumerations and (when interrupt
/// documentation is enabled) a missing interrupt map are fatal.
pub fn generate_docs(soc: &SocDescription, base_dir: &Path, config: &DocConfig) -> Result<()> {
    if config.document_interrupts {
        require_interrupt_map(soc)?;
    }

    fs::create_dir_all(base_dir.join("_static"))
        .with_context(|| format!("creating {}", base_dir.display()))?;

    let mut regions = Vec::new();
    for region in &soc.regions {
        let Some(mut doc) = DocumentedRegion::from_region(region)? else {
            continue;
        };
        if config.document_interrupts && soc.irq_for_region(&doc.name).is_some() {
            annotate_event_registers(soc, &mut doc);
        }
        regions.push(doc);
    }

    let module_docs = gather_module_docs(soc);

    fs::write(base_dir.join("conf.py"), conf_py(config))?;

    let mut extra_pages: Vec<String> = Vec::new();
    if let Some(map) = soc.interrupt_map.as_ref().filter(|_| config.document_interrupts) {
        extra_pages.push("interrupts".to_string());
        fs::write(base_dir.join("interrupts.rst"), interrupts_page(map))?;
    }
    for (name, _) in &module_docs {
        extra_pages.push(name.clone());
    }

    fs::write(
        base_dir.join("index.rst"),
        index_page(config, &extra_pages, &regions),
    )?;

    for (name, page) in &module_docs {
        fs::write(base_dir.join(format!("{}.rst", name)), page)?;
    }

    for region in &regions {
        let page = region_page(region)
            .with_context(|| format!("rendering region `{}`", region.name))?;
        fs::write(base_dir.join(format!("{}.rst", region.name)), page)?;
    }

    log::info!(
        "documentation tree written; build it with `sphinx-build -M html {} {}`",
        base_dir.display(),
        base_dir.join("_build").display()
    );
    Ok(())
}

//=============================================================================
// Page assembly
//=============================================================================

fn conf_py(config: &DocConfig) -> String {
    let year = chrono::Utc::now().year();
    let mut extensions = String::new();
    for ext in &config.sphinx_extensions {
        write!(extensions, "\n    '{}',", ext).unwrap();
    }
    format!(
        "project = '{project}'\n\
         copyright = '{year}, {author}'\n\
         author = '{author}'\n\
         extensions = [\n    \
             'sphinx.ext.autosectionlabel',\n    \
             'sphinxcontrib.wavedrom',{extensions}\n\
         ]\n\
         templates_path = ['_templates']\n\
         exclude_patterns = []\n\
         offline_skin_js_path = \"https://wavedrom.com/skins/default.js\"\n\
         offline_wavedrom_js_path = \"https://wavedrom.com/WaveDrom.js\"\n\
         html_theme = 'alabaster'\n\
         html_static_path = ['_static']\n",
        project = config.project_name,
        year = year,
        author = config.author,
        extensions = extensions,
    )
}

fn index_page(config: &DocConfig, extra_pages: &[String], regions: &[DocumentedRegion]) -> String {
    let mut page = String::new();
    let title = format!("Documentation for {}", config.project_name);
    page.push_str(&heading(&title, '='));
    page.push_str("\n.. toctree::\n    :hidden:\n\n");
    for name in extra_pages {
        writeln!(page, "    {}", name).unwrap();
    }
    for region in regions {
        writeln!(page, "    {}", region.name).unwrap();
    }

    if !extra_pages.is_empty() {
        page.push('\n');
        page.push_str(&heading("Modules", '='));
        page.push('\n');
        for name in extra_pages {
            writeln!(page, "* :doc:`{} <{}>`", name.to_uppercase(), name).unwrap();
        }
    }

    if !regions.is_empty() {
        page.push('\n');
        page.push_str(&heading("Register Groups", '='));
        page.push('\n');
        for region in regions {
            writeln!(
                page,
                "* :doc:`{} <{}>`",
                region.name.to_uppercase(),
                region.name
            )
            .unwrap();
        }
    }

    page.push('\n');
    page.push_str(&heading("Indices and tables", '='));
    page.push_str("\n* :ref:`genindex`\n* :ref:`modindex`\n* :ref:`search`\n");
    page
}

fn interrupts_page(map: &std::collections::BTreeMap<String, u32>) -> String {
    let mut page = String::new();
    page.push_str(&heading("Interrupt Assignments", '='));
    let mut rows = vec![vec!["Interrupt".to_string(), "Number".to_string()]];
    for (name, irq) in map {
        rows.push(vec![name.clone(), irq.to_string()]);
    }
    page.push_str(&print_table(&rows));
    page
}

/// Render one region's page: a title plus one entry per documented
/// register.
pub fn region_page(region: &DocumentedRegion) -> Result<String> {
    let mut page = String::new();
    page.push_str(&heading(&region.name.to_uppercase(), '='));
    for register in &region.registers {
        page.push('\n');
        page.push_str(&render_register(region, register)?);
    }
    Ok(page)
}

fn render_register(region: &DocumentedRegion, register: &DocumentedRegister) -> Result<String> {
    let mut out = String::new();
    out.push_str(&heading(&register.name, '^'));
    writeln!(
        out,
        "\n**Address: 0x{:08x} + 0x{:x} = 0x{:08x}**\n",
        region.origin,
        register.address - region.origin,
        register.address
    )
    .unwrap();
    if let Some(description) = &register.description {
        for line in reflow(description).lines() {
            writeln!(out, "    {}", line).unwrap();
        }
    }
    out.push_str(&wavedrom_diagram(region.bus_width, register));
    if !register.fields.is_empty() {
        out.push_str(&field_table(register)?);
    }
    Ok(out)
}

//=============================================================================
// Bit diagrams
//=============================================================================

/// Render the WaveDrom register diagram: named spans for fields in bit
/// order, unnamed filler for the gaps, filler up to the bus width.
fn wavedrom_diagram(bus_width: usize, register: &DocumentedRegister) -> String {
    let mut spans: Vec<String> = Vec::new();

    if register.fields.is_empty() {
        let label = format!(
            "{}{}",
            register.short_name.to_lowercase(),
            bit_range_label(register.offset, register.size)
        );
        spans.push(format!(
            "{{\"name\": \"{}\",  \"bits\": {}}}",
            label, register.size
        ));
        if register.size < bus_width {
            spans.push(format!("{{\"bits\": {}}}", bus_width - register.size));
        }
    } else {
        let mut fields: Vec<_> = register.fields.iter().collect();
        fields.sort_by_key(|f| f.offset);
        let mut bit_cursor = 0;
        for field in fields {
            if field.offset > bit_cursor {
                spans.push(format!("{{\"bits\": {}}}", field.offset - bit_cursor));
            }
            spans.push(format!(
                "{{\"name\": \"{}\",  \"bits\": {}}}",
                field.display_name(),
                field.width
            ));
            bit_cursor = field.offset + field.width;
        }
        if bit_cursor < bus_width {
            spans.push(format!("{{\"bits\": {}}}", bus_width - bit_cursor));
        }
    }

    let mut out = String::new();
    out.push('\n');
    out.push_str("    .. wavedrom::\n");
    writeln!(out, "        :caption: {}", register.name).unwrap();
    out.push('\n');
    out.push_str("        {\n");
    out.push_str("            \"reg\": [\n");
    for (i, span) in spans.iter().enumerate() {
        let term = if i + 1 == spans.len() { "" } else { "," };
        writeln!(out, "                {}{}", span, term).unwrap();
    }
    writeln!(
        out,
        "            ], \"config\": {{\"hspace\": 400, \"bits\": {}, \"lanes\": 1}}",
        bus_width
    )
    .unwrap();
    out.push_str("        }\n");
    out
}

//=============================================================================
// Field tables
//=============================================================================

fn field_table(register: &DocumentedRegister) -> Result<String> {
    let mut rows = vec![vec![
        "Field".to_string(),
        "Name".to_string(),
        "Description".to_string(),
    ]];
    let mut fields: Vec<_> = register.fields.iter().collect();
    fields.sort_by_key(|f| f.offset);
    for field in fields {
        let mut description = field
            .description
            .as_deref()
            .map(reflow)
            .unwrap_or_default();
        if let Some(values) = &field.values {
            description.push('\n');
            description.push_str(&make_value_table(&field.name, values)?);
        }
        rows.push(vec![
            bit_range_label(field.offset, field.width),
            field.display_name().to_uppercase(),
            description,
        ]);
    }
    Ok(print_table(&rows))
}

//=============================================================================
// Module documentation pages
//=============================================================================

/// Collect documentation modules reachable from the roots, depth first,
/// with a fresh visited set.
fn gather_module_docs(soc: &SocDescription) -> Vec<(String, String)> {
    let mut visited = HashSet::new();
    let mut pages = Vec::new();
    for &root in &soc.root_modules {
        walk_docs(soc, root, &mut visited, &mut pages);
    }
    pages
}

fn walk_docs(
    soc: &SocDescription,
    idx: ModuleIdx,
    visited: &mut HashSet<ModuleIdx>,
    pages: &mut Vec<(String, String)>,
) {
    if !visited.insert(idx) {
        return;
    }
    let module = &soc.module_arena[idx];
    if let ModuleKind::Documentation(doc) = &module.kind {
        let mut page = String::new();
        page.push_str(&heading(doc.title(), '='));
        page.push('\n');
        page.push_str(&doc.body());
        page.push('\n');
        pages.push((module.name.clone(), page));
    }
    for &sub in &module.submodules {
        walk_docs(soc, sub, visited, pages);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose::DocumentedRegion;
    use crate::types::{CsrField, CsrRegion, CsrRegister, FieldValue};

    fn documented(region: CsrRegion) -> DocumentedRegion {
        DocumentedRegion::from_region(&region).unwrap().unwrap()
    }

    #[test]
    fn test_register_entry_layout() {
        let doc = documented(CsrRegion::new("uart", 0x6000_0000, 32).add_register(
            CsrRegister::new("rxtx", 8).with_description("Receive/transmit data."),
        ));
        let page = region_page(&doc).unwrap();
        assert!(page.starts_with("UART\n====\n"));
        assert!(page.contains("UART_RXTX\n^^^^^^^^^\n"));
        assert!(page.contains("**Address: 0x60000000 + 0x0 = 0x60000000**"));
        assert!(page.contains("    Receive/transmit data."));
        assert!(page.contains(".. wavedrom::"));
        assert!(page.contains(":caption: UART_RXTX"));
    }

    #[test]
    fn test_diagram_gap_and_trailing_filler() {
        let doc = documented(
            CsrRegion::new("gpio", 0, 32).add_register(
                CsrRegister::new("ctrl", 32)
                    .add_field(CsrField::new("en", 0, 1))
                    .add_field(CsrField::new("mode", 4, 2)),
            ),
        );
        let diagram = wavedrom_diagram(32, &doc.registers[0]);
        assert!(diagram.contains("{\"name\": \"en\",  \"bits\": 1},"));
        // Gap between bit 1 and bit 4.
        assert!(diagram.contains("{\"bits\": 3},"));
        assert!(diagram.contains("{\"name\": \"mode\",  \"bits\": 2},"));
        // Trailing filler up to the bus width.
        assert!(diagram.contains("{\"bits\": 26}\n"));
        assert!(diagram.contains("\"bits\": 32, \"lanes\": 1"));
    }

    #[test]
    fn test_fieldless_register_pseudo_field() {
        let doc = documented(
            CsrRegion::new("timer", 0, 32).add_register(CsrRegister::new("reload", 20)),
        );
        let diagram = wavedrom_diagram(32, &doc.registers[0]);
        assert!(diagram.contains("{\"name\": \"reload[20:0]\",  \"bits\": 20},"));
        assert!(diagram.contains("{\"bits\": 12}\n"));
    }

    #[test]
    fn test_field_table_content() {
        let doc = documented(
            CsrRegion::new("gpio", 0, 32).add_register(
                CsrRegister::new("ctrl", 32)
                    .add_field(CsrField::new("en", 0, 1).with_description("Enable."))
                    .add_field(
                        CsrField::new("mode", 4, 2).with_values(vec![
                            FieldValue::new("0b00", "Input"),
                            FieldValue::new("0b01", "Output"),
                        ]),
                    ),
            ),
        );
        let table = field_table(&doc.registers[0]).unwrap();
        assert!(table.contains("| [0]"));
        assert!(table.contains("| EN"));
        assert!(table.contains("Enable."));
        assert!(table.contains("| [6:4]"));
        assert!(table.contains("| Value | Description |"));
        assert!(table.contains("Output"));
    }

    #[test]
    fn test_malformed_value_enumeration_aborts() {
        let doc = documented(
            CsrRegion::new("gpio", 0, 32).add_register(
                CsrRegister::new("ctrl", 32)
                    .add_field(CsrField::new("mode", 0, 2).with_values(vec![])),
            ),
        );
        assert!(field_table(&doc.registers[0]).is_err());
    }

    #[test]
    fn test_index_page_sections() {
        let regions = vec![
            documented(CsrRegion::new("uart", 0, 32)),
            documented(CsrRegion::new("timer0", 0x100, 32)),
        ];
        let config = DocConfig::new("Test SoC");
        let page = index_page(&config, &[], &regions);
        assert!(page.starts_with("Documentation for Test SoC\n"));
        assert!(page.contains(".. toctree::\n    :hidden:\n\n    uart\n    timer0\n"));
        assert!(page.contains("Register Groups"));
        assert!(page.contains("* :doc:`UART <uart>`"));
        assert!(page.contains("* :ref:`genindex`"));
        // No modules section without extra pages.
        assert!(!page.contains("Modules\n======="));
    }

    #[test]
    fn test_conf_py_contents() {
        let config = DocConfig::new("Test SoC")
            .with_author("Nobody")
            .add_sphinx_extension("m2r");
        let conf = conf_py(&config);
        assert!(conf.contains("project = 'Test SoC'"));
        assert!(conf.contains("author = 'Nobody'"));
        assert!(conf.contains("'sphinxcontrib.wavedrom',"));
        assert!(conf.contains("'m2r',"));
    }

    #[test]
    fn test_interrupts_page() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("timer0".to_string(), 3);
        map.insert("uart".to_string(), 1);
        let page = interrupts_page(&map);
        assert!(page.starts_with("Interrupt Assignments\n"));
        assert!(page.contains("| timer0"));
        assert!(page.contains("| 3"));
    }
}
