// Licensed under the Apache-2.0 license

//! CMSIS-SVD style peripheral descriptor emitter.
//!
//! Serializes the decomposed region/register/field tree into one XML
//! register map: a `<peripheral>` per region, a `<register>` per
//! documented (bus-word-sized) register, fields with `msb`/`lsb`/
//! `bitRange`, an `<addressBlock>` sized to the region's address cursor,
//! and an `<interrupt>` block for regions with a mapped IRQ.
//!
//! `msb` here is the true inclusive high bit (`offset + width - 1`): the
//! descriptor is consumed by machines, unlike the prose pages.

use crate::config::DocConfig;
use crate::decompose::{DocumentedField, DocumentedRegion, DocumentedRegister};
use crate::rst::reflow;
use crate::types::SocDescription;
use anyhow::{bail, Context, Result};
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Generate the descriptor for `soc` and write it to `path`.
pub fn generate_svd(soc: &SocDescription, path: &Path, config: &DocConfig) -> Result<()> {
    let svd = svd_string(soc, config)?;
    fs::write(path, svd).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Render the descriptor document as a string.
pub fn svd_string(soc: &SocDescription, config: &DocConfig) -> Result<String> {
    let mut svd = String::new();
    svd.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\n");
    svd.push_str(
        "<device schemaVersion=\"1.1\" \
         xmlns:xs=\"http://www.w3.org/2001/XMLSchema-instance\" \
         xs:noNamespaceSchemaLocation=\"CMSIS-SVD.xsd\" >\n",
    );
    writeln!(svd, "    <vendor>{}</vendor>", config.vendor).unwrap();
    writeln!(svd, "    <name>{}</name>", config.device_name.to_uppercase()).unwrap();
    if let Some(description) = &config.description {
        writeln!(
            svd,
            "    <description><![CDATA[{}]]></description>",
            reflow(description)
        )
        .unwrap();
    }
    svd.push('\n');
    svd.push_str("    <addressUnitBits>8</addressUnitBits>\n");
    svd.push_str("    <width>32</width>\n");
    svd.push_str("    <size>32</size>\n");
    svd.push_str("    <access>read-write</access>\n");
    svd.push_str("    <resetValue>0x00000000</resetValue>\n");
    svd.push_str("    <resetMask>0xFFFFFFFF</resetMask>\n\n");
    svd.push_str("    <peripherals>\n");

    for region in &soc.regions {
        let Some(doc) = DocumentedRegion::from_region(region)? else {
            continue;
        };
        write_peripheral(&mut svd, soc, &doc)?;
    }

    svd.push_str("    </peripherals>\n");
    svd.push_str("</device>\n");
    Ok(svd)
}

fn write_peripheral(svd: &mut String, soc: &SocDescription, region: &DocumentedRegion) -> Result<()> {
    let name = region.name.to_uppercase();
    svd.push_str("        <peripheral>\n");
    writeln!(svd, "            <name>{}</name>", name).unwrap();
    writeln!(
        svd,
        "            <baseAddress>0x{:08X}</baseAddress>",
        region.origin
    )
    .unwrap();
    writeln!(svd, "            <groupName>{}</groupName>", name).unwrap();
    if let Some(doc) = soc
        .root_module_by_name(&region.name)
        .and_then(|root| soc.first_module_doc(root))
    {
        writeln!(
            svd,
            "            <description><![CDATA[{}]]></description>",
            reflow(&doc.body())
        )
        .unwrap();
    }
    svd.push_str("            <registers>\n");

    let mut address = 0u64;
    for register in &region.registers {
        write_register(svd, register, address, region.bus_width)?;
        address += 4;
    }

    svd.push_str("            </registers>\n");
    svd.push_str("            <addressBlock>\n");
    svd.push_str("                <offset>0</offset>\n");
    writeln!(svd, "                <size>0x{:x}</size>", address).unwrap();
    svd.push_str("                <usage>registers</usage>\n");
    svd.push_str("            </addressBlock>\n");
    if let Some(irq) = soc.irq_for_region(&region.name) {
        svd.push_str("            <interrupt>\n");
        writeln!(svd, "                <name>{}</name>", region.name).unwrap();
        writeln!(svd, "                <value>{}</value>", irq).unwrap();
        svd.push_str("            </interrupt>\n");
    }
    svd.push_str("        </peripheral>\n");
    Ok(())
}

fn write_register(
    svd: &mut String,
    register: &DocumentedRegister,
    address: u64,
    bus_width: usize,
) -> Result<()> {
    svd.push_str("                <register>\n");
    writeln!(
        svd,
        "                    <name>{}</name>",
        register.short_numbered_name
    )
    .unwrap();
    if let Some(description) = &register.description {
        writeln!(
            svd,
            "                    <description><![CDATA[{}]]></description>",
            reflow(description)
        )
        .unwrap();
    }
    writeln!(
        svd,
        "                    <addressOffset>0x{:04x}</addressOffset>",
        address
    )
    .unwrap();
    writeln!(
        svd,
        "                    <resetValue>0x{:02x}</resetValue>",
        register.reset
    )
    .unwrap();
    // Narrow registers still occupy a full bus word.
    let size = register.size.div_ceil(bus_width) * bus_width;
    writeln!(svd, "                    <size>{}</size>", size).unwrap();
    writeln!(svd, "                    <access>{}</access>", register.access).unwrap();
    svd.push_str("                    <fields>\n");
    if register.fields.is_empty() {
        write_synthesized_field(svd, register);
    } else {
        for field in &register.fields {
            write_field(svd, field)?;
        }
    }
    svd.push_str("                    </fields>\n");
    svd.push_str("                </register>\n");
    Ok(())
}

fn write_field(svd: &mut String, field: &DocumentedField) -> Result<()> {
    if let Some(values) = &field.values {
        if values.is_empty() {
            bail!(
                "field `{}` has a zero-length value enumeration",
                field.name
            );
        }
    }
    let msb = field.offset + field.width - 1;
    svd.push_str("                        <field>\n");
    writeln!(
        svd,
        "                            <name>{}</name>",
        field.display_name()
    )
    .unwrap();
    writeln!(svd, "                            <msb>{}</msb>", msb).unwrap();
    writeln!(
        svd,
        "                            <bitRange>[{}:{}]</bitRange>",
        msb, field.offset
    )
    .unwrap();
    writeln!(svd, "                            <lsb>{}</lsb>", field.offset).unwrap();
    if let Some(description) = &field.description {
        writeln!(
            svd,
            "                            <description><![CDATA[{}]]></description>",
            reflow(description)
        )
        .unwrap();
    }
    svd.push_str("                        </field>\n");
    Ok(())
}

/// Fieldless registers still get one field spanning the register so SVD
/// consumers see a named value. Event-manager registers drop their `ev_`
/// prefix (`ev_pending` reads better as `pending`).
fn write_synthesized_field(svd: &mut String, register: &DocumentedRegister) {
    let mut name = register.short_name.to_lowercase();
    name = match name.as_str() {
        "ev_enable" => "enable".to_string(),
        "ev_pending" => "pending".to_string(),
        "ev_status" => "status".to_string(),
        _ => name,
    };
    svd.push_str("                        <field>\n");
    writeln!(svd, "                            <name>{}</name>", name).unwrap();
    writeln!(
        svd,
        "                            <msb>{}</msb>",
        register.size - 1
    )
    .unwrap();
    writeln!(
        svd,
        "                            <bitRange>[{}:0]</bitRange>",
        register.size - 1
    )
    .unwrap();
    svd.push_str("                            <lsb>0</lsb>\n");
    svd.push_str("                        </field>\n");
}
